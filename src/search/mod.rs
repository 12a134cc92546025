//! Search dispatch: route a phrase to a backend adapter and time it.

pub mod dispatch;

pub use dispatch::Dispatcher;
