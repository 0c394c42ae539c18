//! betterguess: a terminal text editor that augments typing with inline
//! word-completion suggestions fetched from a remote prediction service.
//!
//! The editor shell is deliberately thin. The interesting part is the
//! suggestion coordination loop: every user-driven buffer or caret change
//! dispatches an asynchronous continuation request; responses are marshalled
//! back onto the main loop, stale ones are discarded ("last request wins"),
//! and an accepted candidate is spliced over the in-progress word.

pub mod app;
pub mod config;
pub mod document;
pub mod services;
pub mod suggestions;
pub mod words;
