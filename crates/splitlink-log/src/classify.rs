use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Severity category of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Error,
    Warn,
    Info,
    Detail,
    Silabs,
}

impl Category {
    /// All categories, in filter-bar order.
    pub const ALL: [Category; 5] = [
        Category::Error,
        Category::Warn,
        Category::Info,
        Category::Detail,
        Category::Silabs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Error => "error",
            Category::Warn => "warn",
            Category::Info => "info",
            Category::Detail => "detail",
            Category::Silabs => "silabs",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('[').trim_end_matches(']');
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LogError::UnknownCategory(s.to_string()))
    }
}

/// Subsystem tag used for secondary filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Zcl,
    Dl,
    Im,
    Ot,
    Svr,
    Dis,
    Swu,
    Tst,
}

impl Module {
    /// All modules, in match-priority order.
    pub const ALL: [Module; 8] = [
        Module::Zcl,
        Module::Dl,
        Module::Im,
        Module::Ot,
        Module::Svr,
        Module::Dis,
        Module::Swu,
        Module::Tst,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Module::Zcl => "zcl",
            Module::Dl => "dl",
            Module::Im => "im",
            Module::Ot => "ot",
            Module::Svr => "svr",
            Module::Dis => "dis",
            Module::Swu => "swu",
            Module::Tst => "tst",
        }
    }

    /// Lower-cased bracketed tag as it appears in records.
    pub fn tag(self) -> &'static str {
        match self {
            Module::Zcl => "[zcl]",
            Module::Dl => "[dl]",
            Module::Im => "[im]",
            Module::Ot => "[ot]",
            Module::Svr => "[svr]",
            Module::Dis => "[dis]",
            Module::Swu => "[swu]",
            Module::Tst => "[tst]",
        }
    }

    /// Human-readable subsystem name.
    pub fn label(self) -> &'static str {
        match self {
            Module::Zcl => "Data Model",
            Module::Dl => "Device Layer",
            Module::Im => "Interaction Model",
            Module::Ot => "Open Thread",
            Module::Svr => "App Server",
            Module::Dis => "Discovery",
            Module::Swu => "Software Updates",
            Module::Tst => "Test",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('[').trim_end_matches(']');
        Module::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LogError::UnknownModule(s.to_string()))
    }
}

/// Category tags in match-priority order. Firmware pads short level names,
/// so each level has a plain and a space-padded spelling.
const CATEGORY_TAGS: [(Category, [&str; 2]); 5] = [
    (Category::Error, ["[error]", "[error ]"]),
    (Category::Warn, ["[warn]", "[warn ]"]),
    (Category::Silabs, ["[silabs]", "[silabs ]"]),
    (Category::Detail, ["[detail]", "[detail ]"]),
    (Category::Info, ["[info]", "[info ]"]),
];

/// Result of classifying one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    /// `None` means the record is not subject to module filtering.
    pub module: Option<Module>,
}

/// Classify a record by its severity and module tags (case-insensitive).
///
/// Never fails: untagged records are `info` with no module.
pub fn classify(text: &str) -> Classification {
    let lowered = text.to_ascii_lowercase();
    Classification {
        category: category_in(&lowered),
        module: module_in(&lowered),
    }
}

/// Severity category of `text`; `info` when no level tag is present.
pub fn category_of(text: &str) -> Category {
    category_in(&text.to_ascii_lowercase())
}

/// Module tag of `text`, if any.
pub fn module_of(text: &str) -> Option<Module> {
    module_in(&text.to_ascii_lowercase())
}

fn category_in(lowered: &str) -> Category {
    CATEGORY_TAGS
        .iter()
        .find(|(_, tags)| tags.iter().any(|tag| lowered.contains(tag)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Info)
}

fn module_in(lowered: &str) -> Option<Module> {
    Module::ALL.into_iter().find(|m| lowered.contains(m.tag()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tag_is_case_insensitive() {
        let c = classify("[ERROR] boom");
        assert_eq!(c.category, Category::Error);
        assert_eq!(c.module, None);
    }

    #[test]
    fn module_without_level_defaults_to_info() {
        let c = classify("[dl] ok");
        assert_eq!(c.category, Category::Info);
        assert_eq!(c.module, Some(Module::Dl));
    }

    #[test]
    fn padded_level_tags_match() {
        assert_eq!(category_of("[warn ] [DL] low heap"), Category::Warn);
        assert_eq!(category_of("[info ] ready"), Category::Info);
        assert_eq!(category_of("[Detail ] x"), Category::Detail);
    }

    #[test]
    fn category_priority_beats_position() {
        // error outranks warn even when warn appears first
        assert_eq!(category_of("[warn] retry after [error] timeout"), Category::Error);
        assert_eq!(category_of("[info] [silabs] radio up"), Category::Silabs);
        assert_eq!(category_of("[info] [detail] x"), Category::Detail);
    }

    #[test]
    fn module_priority_follows_declaration_order() {
        assert_eq!(module_of("[TST] then [ZCL]"), Some(Module::Zcl));
        assert_eq!(module_of("[svr][ot]"), Some(Module::Ot));
    }

    #[test]
    fn untagged_text_is_info_without_module() {
        let c = classify("plain text with [brackets]");
        assert_eq!(c.category, Category::Info);
        assert_eq!(c.module, None);
    }

    #[test]
    fn unpadded_tag_required_for_module() {
        assert_eq!(module_of("[ dl ] spaced"), None);
        assert_eq!(module_of("dl without brackets"), None);
    }

    #[test]
    fn every_category_and_module_tag_classifies() {
        for category in Category::ALL {
            let text = format!("[{}] x", category.as_str().to_uppercase());
            assert_eq!(category_of(&text), category);
        }
        for module in Module::ALL {
            let text = module.tag().to_uppercase();
            assert_eq!(module_of(&text), Some(module));
        }
    }

    #[test]
    fn parse_names_and_tags() {
        assert_eq!("warn".parse::<Category>().unwrap(), Category::Warn);
        assert_eq!("[SILABS]".parse::<Category>().unwrap(), Category::Silabs);
        assert_eq!("Svr".parse::<Module>().unwrap(), Module::Svr);
        assert!(matches!(
            "fatal".parse::<Category>(),
            Err(LogError::UnknownCategory(_))
        ));
        assert!(matches!(
            "ble".parse::<Module>(),
            Err(LogError::UnknownModule(_))
        ));
    }

    #[test]
    fn labels_and_display() {
        assert_eq!(Module::Im.label(), "Interaction Model");
        assert_eq!(Module::Swu.to_string(), "swu");
        assert_eq!(Category::Detail.to_string(), "detail");
    }
}
