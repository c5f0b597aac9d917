pub mod auth;
pub mod catalog;
pub mod collections;
pub mod recipes;
