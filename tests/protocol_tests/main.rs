//! Protocol tests
