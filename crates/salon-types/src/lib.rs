pub mod api;
pub mod models;

pub use models::{
    Appointment, Attachment, ClientUpdate, Post, Profile, Reaction, ReactionKind, ReactionTarget,
    Role, UnknownVariant, UpdateCategory,
};
