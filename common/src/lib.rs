//! Wire types shared between the fogmap server and any front end that renders it.

pub mod models;
pub mod protocol;
