//! COBOL copybook to JSON layout conversion for OpenMainframe.
//!
//! This crate turns the data description entries of a fixed-format COBOL
//! copybook into a tree of fields with byte offsets and lengths, suitable for
//! slicing records in tools that do not speak COBOL.
//!
//! # Architecture
//!
//! The conversion is a straight pipeline:
//! 1. The source normalizer strips fixed-format areas and comments, joins
//!    continuation lines and splits the text into statements
//! 2. The tokenizer turns each statement into a level/name/clauses row
//! 3. The layout builder classifies each row and lays out the tree,
//!    sizing elementary items from their PICTURE and USAGE and resolving
//!    REDEFINES targets among earlier siblings
//! 4. The layout is serialized to JSON
//!
//! ```
//! use open_mainframe_copybook::{convert, CopybookConfig};
//!
//! let source = "       01  A PIC 9(3).\n       01  B PIC X(2).\n";
//! let nodes = convert(source, &CopybookConfig::default()).unwrap();
//! assert_eq!(nodes[1].start, 3);
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod naming;
pub mod picture;
pub mod source;
pub mod tokenizer;

pub use config::{CopybookConfig, LayoutConfig, OutputConfig, SourceConfig, UnresolvedRedefines};
pub use error::{CopybookError, Result};
pub use layout::{from_json, to_json, FieldType, LayoutBuilder, LayoutNode, LayoutRun, NodeData};
pub use naming::snake_case;
pub use picture::{PictureError, Usage};
pub use source::{Literal, Statement};
pub use tokenizer::TokenRow;

/// Convert copybook source text into its layout tree.
pub fn convert(source: &str, config: &CopybookConfig) -> Result<Vec<LayoutNode>> {
    let statements = source::normalize(source, &config.source);
    tracing::debug!(statements = statements.len(), "Source normalized");

    let rows = tokenizer::tokenize(&statements)?;
    tracing::debug!(rows = rows.len(), "Statements tokenized");

    LayoutBuilder::new(&config.layout).build(&rows)
}

/// Convert copybook source text straight to JSON, honoring `[output] pretty`.
pub fn convert_to_json(source: &str, config: &CopybookConfig) -> Result<String> {
    let nodes = convert(source, config)?;
    to_json(&nodes, config.output.pretty)
}
