/// Data layer: core types, loading, cleaning and writing.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  price range filter + last_review → date/time
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  Table → .csv
///   └──────────┘
/// ```

pub mod clean;
pub mod datetime;
pub mod loader;
pub mod model;
pub mod writer;
