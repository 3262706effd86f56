pub mod error;
pub mod slug;

#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod app;

pub mod rendering {
    pub mod html;
    pub mod links;
    pub mod render;
    pub mod richtext;
}
pub mod db {
    pub mod document_repository;
    pub mod models;
    pub mod repository;
}
pub mod storage {
    pub mod client;
}
pub mod api {
    pub mod documents;
    pub mod errors;
    pub mod posts;
}
