pub mod health;
pub mod issue;
pub mod migrate;
pub mod sample_template;
pub mod verify;
