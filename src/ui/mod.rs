//! Console interaction: numbered menus and line prompts.

pub mod prompt;
