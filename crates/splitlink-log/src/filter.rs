use crate::classify::{Category, Module};
use crate::store::ClassifiedMessage;

/// Which categories and modules are currently displayed.
///
/// Filtering is a display-time projection; it never removes anything from
/// the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    categories: [bool; Category::ALL.len()],
    modules: [bool; Module::ALL.len()],
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            categories: [true; Category::ALL.len()],
            modules: [true; Module::ALL.len()],
        }
    }
}

impl FilterState {
    /// Whether a record with this classification is displayed.
    ///
    /// Records without a module tag are only subject to the category filter.
    pub fn allows(&self, category: Category, module: Option<Module>) -> bool {
        self.category_enabled(category) && module.is_none_or(|m| self.module_enabled(m))
    }

    pub fn admits(&self, message: &ClassifiedMessage) -> bool {
        self.allows(message.category, message.module)
    }

    pub fn category_enabled(&self, category: Category) -> bool {
        self.categories[category.index()]
    }

    pub fn module_enabled(&self, module: Module) -> bool {
        self.modules[module.index()]
    }

    pub fn set_category(&mut self, category: Category, enabled: bool) {
        self.categories[category.index()] = enabled;
    }

    /// Flip a category and return its new state.
    pub fn toggle_category(&mut self, category: Category) -> bool {
        let slot = &mut self.categories[category.index()];
        *slot = !*slot;
        *slot
    }

    pub fn set_module(&mut self, module: Module, enabled: bool) {
        self.modules[module.index()] = enabled;
    }

    /// Flip a module and return its new state.
    pub fn toggle_module(&mut self, module: Module) -> bool {
        let slot = &mut self.modules[module.index()];
        *slot = !*slot;
        *slot
    }

    pub fn set_all_modules(&mut self, enabled: bool) {
        self.modules = [enabled; Module::ALL.len()];
    }

    pub fn enabled_categories(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL
            .into_iter()
            .filter(|c| self.category_enabled(*c))
    }

    pub fn enabled_modules(&self) -> impl Iterator<Item = Module> + '_ {
        Module::ALL.into_iter().filter(|m| self.module_enabled(*m))
    }

    pub fn all_modules_enabled(&self) -> bool {
        self.modules.iter().all(|enabled| *enabled)
    }

    /// Status line listing the categories on display.
    pub fn category_summary(&self) -> String {
        let enabled: Vec<&str> = self.enabled_categories().map(Category::as_str).collect();
        if enabled.is_empty() {
            "All filters disabled - no logs shown".to_string()
        } else {
            format!("Active filters: {}", enabled.join(", "))
        }
    }

    /// Status line listing the modules on display, by their long names.
    pub fn module_summary(&self) -> String {
        if self.all_modules_enabled() {
            return "All module filters enabled".to_string();
        }
        let enabled: Vec<&str> = self.enabled_modules().map(Module::label).collect();
        if enabled.is_empty() {
            "All module filters disabled - untagged logs only".to_string()
        } else {
            format!("Active module filters: {}", enabled.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_everything() {
        let filter = FilterState::default();
        assert_eq!(filter.enabled_categories().count(), Category::ALL.len());
        assert!(filter.all_modules_enabled());
        assert!(filter.allows(Category::Detail, Some(Module::Swu)));
    }

    #[test]
    fn untagged_records_ignore_module_filter() {
        let mut filter = FilterState::default();
        filter.set_all_modules(false);
        assert!(filter.allows(Category::Info, None));
        assert!(!filter.allows(Category::Info, Some(Module::Zcl)));
    }

    #[test]
    fn category_and_module_must_both_pass() {
        let mut filter = FilterState::default();
        filter.set_module(Module::Ot, false);
        filter.set_category(Category::Warn, false);

        assert!(!filter.allows(Category::Warn, None));
        assert!(!filter.allows(Category::Error, Some(Module::Ot)));
        assert!(filter.allows(Category::Error, Some(Module::Dl)));
    }

    #[test]
    fn toggles_report_new_state() {
        let mut filter = FilterState::default();
        assert!(!filter.toggle_category(Category::Info));
        assert!(filter.toggle_category(Category::Info));
        assert!(!filter.toggle_module(Module::Im));
        assert!(!filter.all_modules_enabled());
        assert_eq!(
            filter.enabled_modules().collect::<Vec<_>>().len(),
            Module::ALL.len() - 1
        );
    }

    #[test]
    fn summaries_name_what_is_shown() {
        let mut filter = FilterState::default();
        assert_eq!(
            filter.category_summary(),
            "Active filters: error, warn, info, detail, silabs"
        );
        assert_eq!(filter.module_summary(), "All module filters enabled");

        filter.set_all_modules(false);
        filter.set_module(Module::Ot, true);
        filter.set_module(Module::Zcl, true);
        assert_eq!(
            filter.module_summary(),
            "Active module filters: Data Model, Open Thread"
        );

        for category in Category::ALL {
            filter.set_category(category, false);
        }
        assert_eq!(
            filter.category_summary(),
            "All filters disabled - no logs shown"
        );
    }

    #[test]
    fn enabled_categories_keep_filter_bar_order() {
        let mut filter = FilterState::default();
        filter.set_category(Category::Warn, false);
        filter.set_category(Category::Detail, false);
        assert_eq!(
            filter.enabled_categories().collect::<Vec<_>>(),
            vec![Category::Error, Category::Info, Category::Silabs]
        );
    }
}
