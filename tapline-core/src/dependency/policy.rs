// tapline-core/src/dependency/policy.rs
//! Ready-made expansion policies.
//!
//! Each returns `None` to leave the edge to the default behaviour, so they
//! can be chained with [`first_match`].

use tapline_common::dependency::{Dependency, DependencyTag};

use super::expand::{default_action, Dependent, ExpandAction};

pub type PolicyFn = fn(&Dependent<'_>, &Dependency) -> Option<ExpandAction>;

/// Prunes edges needed only to build.
pub fn skip_build(_dependent: &Dependent<'_>, dep: &Dependency) -> Option<ExpandAction> {
    (dep.is_build() && !dep.tags().contains(DependencyTag::RUNTIME))
        .then_some(ExpandAction::Prune)
}

/// Prunes edges needed only to test.
pub fn skip_test(_dependent: &Dependent<'_>, dep: &Dependency) -> Option<ExpandAction> {
    (dep.is_test() && !dep.tags().contains(DependencyTag::RUNTIME))
        .then_some(ExpandAction::Prune)
}

/// Keeps direct edges only. Unrequested optional edges are still pruned.
pub fn direct(dependent: &Dependent<'_>, dep: &Dependency) -> Option<ExpandAction> {
    Some(match default_action(dependent, dep) {
        ExpandAction::Prune => ExpandAction::Prune,
        _ => ExpandAction::KeepNoRecurse,
    })
}

/// Asks each policy in turn; the first answer wins.
pub fn first_match(
    policies: Vec<PolicyFn>,
) -> impl FnMut(&Dependent<'_>, &Dependency) -> Option<ExpandAction> {
    move |dependent: &Dependent<'_>, dep: &Dependency| {
        policies.iter().find_map(|policy| policy(dependent, dep))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tapline_common::dependency::BuildOptions;
    use tapline_common::model::FormulaDefinition;

    use super::*;

    fn dependent_parts() -> (Arc<FormulaDefinition>, BuildOptions) {
        (
            Arc::new(FormulaDefinition::new("app", "/core/Formula/app.json", Vec::new())),
            BuildOptions::default(),
        )
    }

    #[test]
    fn skip_build_leaves_runtime_edges_alone() {
        let (formula, build) = dependent_parts();
        let dependent = Dependent {
            formula: &formula,
            build: &build,
        };
        let build_only = Dependency::new_with_tags("cmake", DependencyTag::BUILD);
        let both = Dependency::new_with_tags("zlib", DependencyTag::BUILD | DependencyTag::RUNTIME);

        assert_eq!(skip_build(&dependent, &build_only), Some(ExpandAction::Prune));
        assert_eq!(skip_build(&dependent, &both), None);
    }

    #[test]
    fn direct_still_prunes_unrequested_optionals() {
        let (formula, build) = dependent_parts();
        let dependent = Dependent {
            formula: &formula,
            build: &build,
        };
        let optional = Dependency::new_with_tags(
            "gpgme",
            DependencyTag::RUNTIME | DependencyTag::OPTIONAL,
        );
        let plain = Dependency::new_runtime("openssl");

        assert_eq!(direct(&dependent, &optional), Some(ExpandAction::Prune));
        assert_eq!(direct(&dependent, &plain), Some(ExpandAction::KeepNoRecurse));
    }

    #[test]
    fn first_match_falls_through_to_later_policies() {
        let (formula, build) = dependent_parts();
        let dependent = Dependent {
            formula: &formula,
            build: &build,
        };
        let mut policy = first_match(vec![skip_test, direct]);
        let test_only = Dependency::new_with_tags("check", DependencyTag::TEST);

        assert_eq!(policy(&dependent, &test_only), Some(ExpandAction::Prune));
        assert_eq!(
            policy(&dependent, &Dependency::new_runtime("openssl")),
            Some(ExpandAction::KeepNoRecurse)
        );
    }
}
