//! Clickgraph Core Types
//!
//! This crate provides the foundational types shared by layout engines and the
//! interactive render controller. It includes:
//!
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Points, bounds, transforms and viewBox mapping ([`geometry`] module)
//! - **Text**: Label measurement ([`text::TextStyle`])
//! - **Scene**: The rendered element tree with hit testing ([`scene`] module)
//! - **Layout**: The asynchronous layout engine seam ([`layout::LayoutEngine`])

pub mod color;
pub mod geometry;
pub mod layout;
pub mod scene;
pub mod text;
