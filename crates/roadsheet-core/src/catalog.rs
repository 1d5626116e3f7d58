use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Line-item category of a materials document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Paint,
    Thermo,
    Rpm,
    Grinding,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Paint,
        Category::Thermo,
        Category::Rpm,
        Category::Grinding,
    ];

    /// Key of the nested object and prefix of the flat form fields
    pub fn key(&self) -> &'static str {
        match self {
            Category::Paint => "paint",
            Category::Thermo => "thermo",
            Category::Rpm => "rpm",
            Category::Grinding => "grinding",
        }
    }

    /// Section title on the printed report
    pub fn title(&self) -> &'static str {
        match self {
            Category::Paint => "PAINT",
            Category::Thermo => "THERMO",
            Category::Rpm => "RPM",
            Category::Grinding => "GRINDING",
        }
    }

    /// Keys written by the normalizer, in form order
    pub fn stored_keys(&self) -> &'static [&'static str] {
        match self {
            Category::Paint => PAINT_KEYS,
            Category::Thermo => THERMO_KEYS,
            Category::Rpm => RPM_KEYS,
            Category::Grinding => GRINDING_KEYS,
        }
    }

    /// Row labels printed on the report, in print order
    pub fn report_labels(&self) -> &'static [&'static str] {
        match self {
            Category::Paint => PAINT_LABELS,
            Category::Thermo => THERMO_LABELS,
            Category::Rpm => RPM_LABELS,
            Category::Grinding => GRINDING_LABELS,
        }
    }

    /// Name of the flat form field carrying `key`
    pub fn field_name(&self, key: &str) -> String {
        format!("{}_{}", self.key(), key)
    }
}

const PAINT_KEYS: &[&str] = &[
    "4_yel_sld",
    "4_yel_skip",
    "4_wh_sld",
    "4_wh_skip",
    "6_yel_sld",
    "6_yel_skip",
    "6_wh_sld",
    "6_wh_skip",
    "8_wh_sld",
    "12_wh_sld",
    "24_wh_sld",
    "yield",
    "arrows",
    "combo",
    "only",
    "rxr",
];

const THERMO_KEYS: &[&str] = &[
    "4_yel_sld",
    "4_yel_skip",
    "4_wh_sld",
    "4_wh_skip",
    "6_yel_sld",
    "6_wh_sld",
    "6_wh_skip",
    "8_wh_sld",
    "12_wh_sld",
    "24_wh_sld",
    "yield",
    "arrow",
    "combo",
    "only",
    "rxr",
];

const RPM_KEYS: &[&str] = &["amber_1_way", "amber_2_way", "clear_1_way", "clear_2_way"];

const GRINDING_KEYS: &[&str] = &["4_wide", "24_wide"];

const PAINT_LABELS: &[&str] = &[
    r#"4" YEL SLD"#,
    r#"4" YEL SKIP"#,
    r#"4" WH SLD"#,
    r#"4" WH SKIP"#,
    r#"6" YEL SLD"#,
    r#"6" YEL SKIP"#,
    r#"6" WH SLD"#,
    r#"6" WH SKIP"#,
    r#"8" WH SLD"#,
    r#"12" WH SLD"#,
    r#"24" WH SLD"#,
    "YIELD (12x18)",
    "YIELD (24x36)",
    "ARROWS",
    "COMBO",
    "ONLY",
    "RxR",
];

const THERMO_LABELS: &[&str] = &[
    r#"4" YEL SLD"#,
    r#"4" YEL SKIP"#,
    r#"4" WH SLD"#,
    r#"4" WH SKIP"#,
    r#"6" YEL SLD"#,
    r#"6" WH SLD"#,
    r#"6" WH SKIP"#,
    r#"8" WH SLD"#,
    r#"12" WH SLD"#,
    r#"24" WH SLD"#,
    "YIELD (12x18)",
    "YIELD (24x36)",
    "ARROW",
    "COMBO",
    "ONLY",
    "RxR",
];

const RPM_LABELS: &[&str] = &["AMBER 1 way", "AMBER 2 way", "CLEAR 1 way", "CLEAR 2 way"];

const GRINDING_LABELS: &[&str] = &[r#"4" WIDE"#, r#"24" WIDE"#, "ARROWS"];

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Derive the lookup key for a printed label.
///
/// Runs of non-alphanumeric characters collapse to a single `_`, so labels
/// ending in punctuation keep a trailing underscore (`YIELD (12x18)` becomes
/// `yield_12x18_`).
pub fn label_key(label: &str) -> String {
    NON_ALNUM.replace_all(label, "_").to_lowercase()
}

/// Candidate locations for a label, in the order they are tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLocation {
    /// `doc[category][key]`
    Nested(String),
    /// `doc["<category>_<key>"]`
    Flat(String),
}

/// Lookup chain for a report label.
///
/// nested-correct, nested-legacy-suffix, flat-correct, flat-legacy. The
/// "correct" key has leading and trailing underscores trimmed; the legacy
/// key is the raw derivation.
pub fn lookup_chain(category: Category, label: &str) -> Vec<KeyLocation> {
    let legacy = label_key(label);
    let correct = legacy.trim_matches('_').to_string();

    let mut chain = vec![KeyLocation::Nested(correct.clone())];
    if legacy != correct {
        chain.push(KeyLocation::Nested(legacy.clone()));
    }
    chain.push(KeyLocation::Flat(category.field_name(&correct)));
    if legacy != correct {
        chain.push(KeyLocation::Flat(category.field_name(&legacy)));
    }
    chain
}
