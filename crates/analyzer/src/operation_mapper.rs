//! Operation classification into CRUD verbs
//!
//! Maps Kubernetes method names (operation ids with API tokens stripped) to
//! the CRUD verbs synthetic bindings are derived for.

use kubemodel_common::CrudVerb;

/// Classifies method names into CRUD verbs
pub struct OperationClassifier;

impl OperationClassifier {
    /// Classify a method name into a CRUD verb
    ///
    /// # Examples
    /// ```
    /// use kubemodel_analyzer::OperationClassifier;
    /// use kubemodel_common::CrudVerb;
    ///
    /// assert_eq!(
    ///     OperationClassifier::classify("createNamespacedPod"),
    ///     Some(CrudVerb::Create)
    /// );
    /// assert_eq!(
    ///     OperationClassifier::classify("patchNamespacedPod"),
    ///     Some(CrudVerb::Update)
    /// );
    /// assert_eq!(OperationClassifier::classify("readNamespacedPodLog"), None);
    /// ```
    pub fn classify(method_name: &str) -> Option<CrudVerb> {
        if method_name.starts_with("create") {
            return Some(CrudVerb::Create);
        }

        // Logs are streamed text, not the object
        if method_name.starts_with("read") && !method_name.ends_with("Log") {
            return Some(CrudVerb::Read);
        }

        if method_name.starts_with("patch") {
            return Some(CrudVerb::Update);
        }

        if method_name.starts_with("delete") && !method_name.starts_with("deleteCollection") {
            return Some(CrudVerb::Delete);
        }

        None
    }

    /// Whether the method addresses `class_name` itself rather than a
    /// sub-resource such as `…PodStatus`
    ///
    /// ```
    /// use kubemodel_analyzer::OperationClassifier;
    ///
    /// assert!(OperationClassifier::targets("readNamespacedPod", "Pod"));
    /// assert!(!OperationClassifier::targets("readNamespacedPodStatus", "Pod"));
    /// ```
    pub fn targets(method_name: &str, class_name: &str) -> bool {
        method_name
            .to_lowercase()
            .ends_with(&class_name.to_lowercase())
    }
}
