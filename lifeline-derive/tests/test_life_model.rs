//! Tests for the `LifeModel` derive: column accessors, row mapping and
//! relation fields.

use lifeline::{
    FromRow, LifeError, LifeModel, LoadTree, ModelError, ModelTrait, PivotDef, RelatedField, RelationDef,
    RelationError, Row, WithRelations,
};
use sea_query::Value;
use std::collections::HashSet;

pub const AUTHOR_BOOKS: RelationDef = RelationDef::has_many("books", "authors", "books", "author_id", "id");
pub const AUTHOR_BEST_SELLER: RelationDef =
    RelationDef::latest_of_many("best_seller", "authors", "books", "author_id", "id", "copies_sold");
pub const AUTHOR_GENRES: RelationDef =
    RelationDef::belongs_to_many("genres", "authors", "genres", PivotDef::new("author_genre", "author_id", "genre_id"));
pub const BOOK_AUTHOR: RelationDef = RelationDef::belongs_to("author", "books", "authors", "author_id", "id");

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "authors"]
pub struct Author {
    #[primary_key]
    #[auto_increment]
    pub id: i64,
    #[column_name = "full_name"]
    pub name: String,
    pub born: Option<chrono::NaiveDate>,
    #[relation = "AUTHOR_BOOKS"]
    pub books: Vec<Book>,
    #[relation = "AUTHOR_BEST_SELLER"]
    pub best_seller: Option<Book>,
    #[relation = "AUTHOR_GENRES"]
    pub genres: HashSet<Genre>,
}

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "books"]
pub struct Book {
    pub id: i64,
    pub author_id: i64,
    pub copies_sold: i32,
    #[relation = "BOOK_AUTHOR"]
    pub author: Option<Box<Author>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, LifeModel)]
pub struct Genre {
    pub id: i32,
    pub label: String,
}

#[test]
fn test_table_and_columns() {
    assert_eq!(Author::table_name(), "authors");
    assert_eq!(Author::primary_key(), "id");
    assert_eq!(Author::column_names(), &["id", "full_name", "born"]);
    assert_eq!(Book::primary_key(), "id");
    assert_eq!(Genre::table_name(), "genre");
}

#[test]
fn test_get_by_column_name_accepts_aliases() {
    let author = Author {
        id: 7,
        name: "Le Guin".to_string(),
        ..Author::default()
    };
    assert_eq!(author.get_by_column_name("id"), Some(Value::BigInt(Some(7))));
    assert_eq!(author.get_by_column_name("full_name"), Some(Value::from("Le Guin")));
    assert_eq!(author.get_by_column_name("fullName"), Some(Value::from("Le Guin")));
    assert_eq!(author.get_by_column_name("name"), Some(Value::from("Le Guin")));
    assert_eq!(author.get_by_column_name("born"), Some(Value::from(None::<chrono::NaiveDate>)));
    assert_eq!(author.get_by_column_name("books"), None);
    assert_eq!(author.get_primary_key_value(), Value::BigInt(Some(7)));
}

#[test]
fn test_set_by_column_name_converts_and_validates() {
    let mut book = Book::default();
    book.set_by_column_name("authorId", Value::Int(Some(3))).unwrap();
    assert_eq!(book.author_id, 3);

    let err = book.set_by_column_name("author_id", Value::Int(None)).unwrap_err();
    assert!(matches!(err, ModelError::InvalidValue { ref column, .. } if column == "author_id"));

    let err = book.set_by_column_name("publisher_id", Value::Int(Some(1))).unwrap_err();
    assert_eq!(
        err,
        ModelError::ColumnNotFound {
            table: "books",
            column: "publisher_id".to_string()
        }
    );
}

#[test]
fn test_insert_values_skip_auto_increment() {
    let author = Author {
        id: 1,
        name: "Banks".to_string(),
        ..Author::default()
    };
    let columns: Vec<&str> = author.insert_values().iter().map(|(c, _)| *c).collect();
    assert_eq!(columns, vec!["full_name", "born"]);

    let book = Book::default();
    let columns: Vec<&str> = book.insert_values().iter().map(|(c, _)| *c).collect();
    assert_eq!(columns, vec!["id", "author_id", "copies_sold"]);
}

#[test]
fn test_from_row_leaves_relations_empty() {
    let row = Row::new()
        .with("id", Value::BigInt(Some(2)))
        .with("full_name", "Butler")
        .with("born", None::<chrono::NaiveDate>);
    let author = Author::from_row(&row).unwrap();
    assert_eq!(author.id, 2);
    assert_eq!(author.name, "Butler");
    assert!(author.born.is_none());
    assert!(author.books.is_empty() && author.best_seller.is_none() && author.genres.is_empty());
}

#[test]
fn test_from_row_widens_integers_and_reports_missing_columns() {
    let row = Row::new()
        .with("id", 5)
        .with("author_id", 2)
        .with("copies_sold", 100);
    let book = Book::from_row(&row).unwrap();
    assert_eq!((book.id, book.author_id, book.copies_sold), (5, 2, 100));

    let err = Book::from_row(&Row::new().with("id", 5)).unwrap_err();
    assert!(matches!(err, LifeError::ParseError(ref msg) if msg.contains("author_id")));
}

#[test]
fn test_load_request_resolves_relation_names() {
    assert!(Author::load_request("books").is_some());
    assert!(Author::load_request("bestSeller").is_some());
    assert!(Author::load_request("reviews").is_none());
    assert!(Genre::load_request("anything").is_none());

    let tree = LoadTree::<Author>::from_paths(&["books.author", "genres"]).unwrap();
    assert_eq!(tree.node_count(), 3);
}

#[test]
fn test_related_field_per_type() {
    assert!(<Author as RelatedField<Book>>::accepts_related_field("books"));
    assert!(<Author as RelatedField<Book>>::accepts_related_field("best_seller"));
    assert!(!<Author as RelatedField<Book>>::accepts_related_field("genres"));
    assert!(<Author as RelatedField<Genre>>::accepts_related_field("genres"));

    assert_eq!(<Author as RelatedField<Book>>::related_field_is_singular("books"), Some(false));
    assert_eq!(<Author as RelatedField<Book>>::related_field_is_singular("bestSeller"), Some(true));
    assert_eq!(<Author as RelatedField<Genre>>::related_field_is_singular("genres"), Some(false));
    assert_eq!(<Book as RelatedField<Author>>::related_field_is_singular("author"), Some(true));
    assert_eq!(<Author as RelatedField<Book>>::related_field_is_singular("genres"), None);

    let mut author = Author::default();
    let books = vec![
        Book { id: 1, ..Book::default() },
        Book { id: 2, ..Book::default() },
    ];
    author.assign_related("books", books.clone()).unwrap();
    author.assign_related("best_seller", books).unwrap();
    assert_eq!(author.books.len(), 2);
    assert_eq!(author.best_seller.as_ref().map(|b| b.id), Some(1));

    let genre = Genre {
        id: 1,
        label: "sf".to_string(),
    };
    author.assign_related("genres", vec![genre.clone(), genre]).unwrap();
    assert_eq!(author.genres.len(), 1);

    let err = <Author as RelatedField<Book>>::assign_related(&mut author, "genres", Vec::new()).unwrap_err();
    assert!(matches!(err, RelationError::UnknownField { entity: "authors", .. }));

    let mut book = Book::default();
    book.assign_related("author", vec![Author::default()]).unwrap();
    assert!(book.author.is_some());
}
