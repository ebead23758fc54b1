//! Entities and row builders shared by the unit tests.
//!
//! A small blog schema: users write posts, posts have comments and tags,
//! users hold roles through `role_user`, countries reach posts through users.

use crate::relation::{PivotDef, RelationDef, ThroughDef};
use crate::row::Row;
use crate::LifeModel;
use std::collections::BTreeSet;

pub const USER_POSTS: RelationDef = RelationDef::has_many("posts", "users", "posts", "user_id", "id");
pub const USER_PROFILE: RelationDef = RelationDef::has_one("profile", "users", "profiles", "user_id", "id");
pub const USER_LATEST_POST: RelationDef =
    RelationDef::latest_of_many("latest_post", "users", "posts", "user_id", "id", "created_at");
pub const USER_ROLES: RelationDef = RelationDef::belongs_to_many(
    "roles",
    "users",
    "roles",
    PivotDef::new("role_user", "user_id", "role_id").with_timestamps(),
);
pub const USER_IMAGE: RelationDef = RelationDef::morph_one("image", "users", "images", "imageable");

pub const POST_AUTHOR: RelationDef = RelationDef::belongs_to("author", "posts", "users", "user_id", "id");
pub const POST_EDITOR: RelationDef = RelationDef::belongs_to("editor", "posts", "users", "editor_id", "id");
pub const POST_COMMENTS: RelationDef = RelationDef::has_many("comments", "posts", "comments", "post_id", "id");
pub const POST_TAGS: RelationDef =
    RelationDef::belongs_to_many("tags", "posts", "tags", PivotDef::new("post_tag", "post_id", "tag_id"));

pub const COUNTRY_POSTS: RelationDef = RelationDef::has_many_through(
    "posts",
    "countries",
    "posts",
    ThroughDef::new("users", "country_id", "user_id"),
);

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "users"]
pub struct User {
    #[primary_key]
    #[auto_increment]
    pub id: i32,
    pub name: String,
    pub country_id: Option<i32>,
    #[relation = "USER_POSTS"]
    pub posts: Vec<Post>,
    #[relation = "USER_PROFILE"]
    pub profile: Option<Profile>,
    #[relation = "USER_LATEST_POST"]
    pub latest_post: Option<Post>,
    #[relation = "USER_ROLES"]
    pub roles: Vec<Role>,
    #[relation = "USER_IMAGE"]
    pub image: Option<Image>,
}

impl User {
    pub fn with_id(id: i32) -> Self {
        Self {
            id,
            name: format!("user{id}"),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "posts"]
pub struct Post {
    #[primary_key]
    #[auto_increment]
    pub id: i32,
    pub user_id: i32,
    pub editor_id: Option<i32>,
    pub title: String,
    pub published: bool,
    #[relation = "POST_AUTHOR"]
    pub author: Option<Box<User>>,
    #[relation = "POST_EDITOR"]
    pub editor: Option<Box<User>>,
    #[relation = "POST_COMMENTS"]
    pub comments: Vec<Comment>,
    #[relation = "POST_TAGS"]
    pub tags: BTreeSet<Tag>,
}

impl Post {
    pub fn new(id: i32, user_id: i32) -> Self {
        Self {
            id,
            user_id,
            title: format!("post{id}"),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "comments"]
pub struct Comment {
    #[primary_key]
    #[auto_increment]
    pub id: i32,
    pub post_id: i32,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "profiles"]
pub struct Profile {
    #[primary_key]
    #[auto_increment]
    pub id: i32,
    pub user_id: i32,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "roles"]
pub struct Role {
    #[primary_key]
    #[auto_increment]
    pub id: i32,
    pub name: String,
}

impl Role {
    pub fn new(id: i32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, LifeModel)]
#[table_name = "tags"]
pub struct Tag {
    #[primary_key]
    pub id: i32,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "images"]
pub struct Image {
    #[primary_key]
    pub id: i32,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "countries"]
pub struct Country {
    #[primary_key]
    pub id: i32,
    pub name: String,
    #[relation = "COUNTRY_POSTS"]
    pub posts: Vec<Post>,
}

impl Country {
    pub fn new(id: i32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            posts: Vec::new(),
        }
    }
}

pub fn user_row(id: i32, name: &str) -> Row {
    Row::new()
        .with("id", id)
        .with("name", name)
        .with("country_id", None::<i32>)
}

pub fn post_row(id: i32, user_id: i32) -> Row {
    Row::new()
        .with("id", id)
        .with("user_id", user_id)
        .with("editor_id", None::<i32>)
        .with("title", format!("post{id}"))
        .with("published", true)
}

pub fn comment_row(id: i32, post_id: i32) -> Row {
    Row::new()
        .with("id", id)
        .with("post_id", post_id)
        .with("body", format!("comment{id}"))
}

pub fn profile_row(id: i32, user_id: i32) -> Row {
    Row::new()
        .with("id", id)
        .with("user_id", user_id)
        .with("bio", None::<String>)
}

pub fn role_row(id: i32, name: &str) -> Row {
    Row::new().with("id", id).with("name", name)
}

pub fn pivot_row(user_id: i32, role_id: i32) -> Row {
    Row::new().with("user_id", user_id).with("role_id", role_id)
}
