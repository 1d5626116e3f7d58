pub mod catalog;
pub mod document;
pub mod error;
pub mod layout;
pub mod materials;
pub mod messaging;
pub mod normalize;
pub mod search;
pub mod sheet;

pub use catalog::{label_key, lookup_chain, Category, KeyLocation};
pub use document::{Shape, StoredMaterials};
pub use error::CoreError;
pub use layout::{
    format_date, format_time, layout_report, DrawOp, Metrics, PageLayout, PlacedSection,
    ReportSheet, Section, PAGE_HEIGHT, PAGE_WIDTH,
};
pub use materials::{Header, LineItems, Materials, Quantity};
pub use messaging::{Audience, ReadMarkers, Role};
pub use normalize::{coerce_count, merge_over, normalize};
pub use search::SearchFields;
pub use sheet::{coerce_miles, Actor, SheetStatus};
