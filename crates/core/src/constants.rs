//! Constants used throughout the report core crate.
//!
//! Marker sentinels, builder styling and storage names live here so the codec, builder,
//! editor and stores agree on them.

/// Opening fence of the embedded field-template marker block.
pub const MARKER_OPEN: &str = "<!--FIELD_TEMPLATE:";

/// Closing fence of the embedded field-template marker block.
pub const MARKER_CLOSE: &str = ":END_FIELD_TEMPLATE-->";

/// Label used for the single placeholder row when no field has a label yet.
pub const PLACEHOLDER_LABEL: &str = "Field";

/// Class on the outer table produced by the template builder.
pub const FIELD_TABLE_CLASS: &str = "field-template";

/// Class on nested tables that subdivide a single cell.
pub const SPLIT_TABLE_CLASS: &str = "split-cell";

/// Class on the outer wrapper of rendered results.
pub const RESULT_WRAPPER_CLASS: &str = "report-result";

/// Style of the label (left) cell in builder rows.
pub const LABEL_CELL_STYLE: &str =
    "width:30%;font-weight:600;background:#f3f4f6;border:1px solid #000;padding:4px 8px;";

/// Style of the value (right) cell in builder rows.
pub const VALUE_CELL_STYLE: &str = "border:1px solid #000;padding:0;";

/// Style of builder and editor tables.
pub const TABLE_STYLE: &str = "width:100%;border-collapse:collapse;";

/// Rule drawn between side-by-side regions of a split cell.
pub const VERTICAL_RULE: &str = "border-right:1px solid #000;";

/// Rule drawn between stacked regions of a split cell.
pub const HORIZONTAL_RULE: &str = "border-bottom:1px solid #000;";

/// Outline applied to the highlighted cell or region in editor previews.
pub const HIGHLIGHT_STYLE: &str = "outline:2px solid #2563eb;";

/// Smallest font size (px) accepted by the editor unless configured otherwise.
pub const DEFAULT_FONT_SIZE_MIN: u16 = 8;

/// Largest font size (px) accepted by the editor unless configured otherwise.
pub const DEFAULT_FONT_SIZE_MAX: u16 = 72;

/// Default directory for template and result storage.
pub const DEFAULT_REPORT_DATA_DIR: &str = "report_data";

/// Directory (under the data dir) holding template markup.
pub const TEMPLATES_DIR_NAME: &str = "templates";

/// Directory (under the data dir) holding result records.
pub const RESULTS_DIR_NAME: &str = "results";

/// File extension of stored template markup.
pub const TEMPLATE_FILE_EXTENSION: &str = "html";

/// File extension of stored result records.
pub const RESULT_FILE_EXTENSION: &str = "json";

/// Style of the label heading above each rendered result block.
pub const RESULT_LABEL_STYLE: &str = "font-weight:bold;margin:8px 0 4px;";

/// Style of the tables used for paired (two-value) results.
pub const RESULT_TABLE_STYLE: &str = "width:100%;border-collapse:collapse;margin-bottom:6px;";

/// Style of the first column of a paired result row.
pub const RESULT_KEY_CELL_STYLE: &str =
    "width:25%;text-align:right;font-weight:bold;padding:2px 8px;vertical-align:top;";

/// Style of the value column(s) of a paired result row.
pub const RESULT_VALUE_CELL_STYLE: &str = "padding:2px 8px;vertical-align:top;";

/// Class of the placeholder rendered for a field with no values.
pub const RESULT_EMPTY_CLASS: &str = "report-result-empty";
