mod common;

mod media;
mod validation;
