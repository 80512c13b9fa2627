pub mod analytics;
pub mod clock;
pub mod content;
pub mod editor;
pub mod events;
pub mod upload;
