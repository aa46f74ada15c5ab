//! Global constants for the bbox review editor

/// Upper bound of percent space on either axis
pub const PERCENT_MAX: f64 = 100.0;

/// Minimum width/height (in percent) of a drawn or resized box
pub const MIN_BOX_SIZE_PERCENT: f64 = 2.0;

/// Default grab radius around a resize handle, in display pixels
pub const DEFAULT_HANDLE_HIT_RADIUS_PX: f64 = 8.0;

/// Sentinel shown by consumers for an unset label
pub const UNSET_LABEL: &str = "NULL";

/// Label names the review tool knows about
pub const KNOWN_LABELS: &[&str] = &["color", "brand", "model", "label", "type", "sub_type"];

/// Extension of the per-image sidecar file
pub const SIDECAR_EXTENSION: &str = "json";

/// Suffix appended while a file is being written atomically
pub const TEMP_SUFFIX: &str = "tmp";

/// File name of the dataset-level manifest under the dataset root
pub const DATASET_MANIFEST_NAME: &str = "annotations.jsonl";

/// Application directory name under the user's config dir
pub const APP_DIR_NAME: &str = "bbox_review";

/// Config file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "config.json";
