pub mod config;
pub mod decode;
pub mod display;
pub mod error;
pub mod events;
pub mod gesture;
pub mod media;
pub mod processing {
    pub mod layout;
    pub mod resize;
}
pub mod slideshow;
pub mod tasks {
    pub mod files;
    pub mod input;
    pub mod player;
}
