#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Substring of the overall message the platform returns when the attempt page
/// is stale and student attempts must be reset before grading resumes.
pub const STALE_ATTEMPT_SENTINEL: &str = "Please refresh your page";

/// Substring of the overall message marking a grading error (e.g. a formula
/// the grader could not evaluate).
pub const GRADING_ERROR_INDICATOR: &str = "Error";

/// Maximum number of submit -> reset cycles before the state machine gives up
/// waiting for a fresh attempt and evaluates whatever it has.
pub const MAX_RESET_CYCLES: usize = 10;

/// Maximum number of status-key reparses with a reduced x offset.
pub const MAX_OFFSET_REPARSES: usize = 1;

/// Platform x index of the first answer box. The engine counts from zero.
pub const DEFAULT_X_OFFSET: u32 = 2;

/// Platform y index of the first input within an answer box.
pub const DEFAULT_Y_OFFSET: u32 = 1;

/// Role prefix of submitted input fields.
pub const INPUT_PREFIX: &str = "input";

/// Role prefix of the result markers in returned markup.
pub const STATUS_PREFIX: &str = "status";

/// Class tokens stripped from a status element before it is classified.
pub const CLASS_NOISE: [&str; 3] = ["choicegroup_", "status", "inline"];

/// Environment variable holding the LMS base url.
pub const ENV_SITE_BASE_URL: &str = "EDXCUT_SITE_BASE_URL";

/// Environment variable holding the staff username.
pub const ENV_USERNAME: &str = "EDXCUT_USERNAME";

/// Environment variable holding the staff password.
pub const ENV_PASSWORD: &str = "EDXCUT_PASSWORD";

/// Environment variable holding the course id.
pub const ENV_COURSE_ID: &str = "EDXCUT_COURSE_ID";

/// Environment variable that disables TLS certificate checks when truthy.
pub const ENV_ACCEPT_INVALID_CERTS: &str = "EDXCUT_ACCEPT_INVALID_CERTS";
