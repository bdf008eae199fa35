#![forbid(unsafe_code)]

//! Keyboard-reachability rules.
//!
//! # Invariants
//!
//! 1. A node with a negative tab-index is never sequentially focusable
//!    under [`FocusPolicy::interactive`], whatever its tag.
//! 2. Tag comparison is ASCII case-insensitive.
//! 3. An unparseable `tabindex` value is treated as absent.
//!
//! # Failure Modes
//!
//! | Input | Behavior |
//! |-------|----------|
//! | `tabindex="abc"` | Treated as absent |
//! | `tabindex=" 2 "` | Trimmed, parsed as 2 |
//! | `<a>` without `href` | Not focusable |

/// Read-only view of a node for focusability decisions.
pub trait AccessNode {
    /// Lower- or mixed-case tag name (`"button"`, `"div"`, ...).
    fn tag(&self) -> &str;

    /// Attribute value, if present.
    fn attr(&self, name: &str) -> Option<&str>;

    /// Whether the attribute is present at all.
    fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

/// Parse the node's `tabindex` attribute.
///
/// Returns `None` when the attribute is missing or not an integer.
#[must_use]
pub fn tab_index<N: AccessNode + ?Sized>(node: &N) -> Option<i32> {
    node.attr("tabindex")
        .and_then(|raw| raw.trim().parse::<i32>().ok())
}

/// One clause of a focusability rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusRule {
    /// Any element with this tag.
    Tag(&'static str),
    /// Element with this tag that also carries `attr`.
    TagWithAttr {
        tag: &'static str,
        attr: &'static str,
    },
    /// Any element with an explicit tab-index of zero or more.
    NonNegativeTabIndex,
}

impl FocusRule {
    fn matches<N: AccessNode + ?Sized>(&self, node: &N) -> bool {
        match self {
            Self::Tag(tag) => node.tag().eq_ignore_ascii_case(tag),
            Self::TagWithAttr { tag, attr } => {
                node.tag().eq_ignore_ascii_case(tag) && node.has_attr(attr)
            }
            Self::NonNegativeTabIndex => tab_index(node).is_some_and(|idx| idx >= 0),
        }
    }
}

const DISABLEABLE: [&str; 4] = ["button", "input", "select", "textarea"];

/// Predicate deciding which nodes join sequential keyboard navigation.
///
/// A node is focusable when at least one rule matches and no exclusion
/// applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusPolicy {
    rules: Vec<FocusRule>,
    skip_negative_tab_index: bool,
    skip_disabled: bool,
}

impl Default for FocusPolicy {
    fn default() -> Self {
        Self::interactive()
    }
}

impl FocusPolicy {
    /// Natively interactive elements plus explicit non-negative tab-indices.
    ///
    /// Buttons, links with a target, inputs, text areas and selects; any
    /// element with `tabindex >= 0`; minus negative tab-indices and
    /// disabled form controls.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            rules: vec![
                FocusRule::Tag("button"),
                FocusRule::TagWithAttr {
                    tag: "a",
                    attr: "href",
                },
                FocusRule::Tag("input"),
                FocusRule::Tag("textarea"),
                FocusRule::Tag("select"),
                FocusRule::NonNegativeTabIndex,
            ],
            skip_negative_tab_index: true,
            skip_disabled: true,
        }
    }

    /// A policy with only the given rules and both exclusions enabled.
    #[must_use]
    pub fn new(rules: Vec<FocusRule>) -> Self {
        Self {
            rules,
            skip_negative_tab_index: true,
            skip_disabled: true,
        }
    }

    /// Add a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: FocusRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Exclude nodes whose tab-index is negative.
    #[must_use]
    pub fn skip_negative_tab_index(mut self, skip: bool) -> Self {
        self.skip_negative_tab_index = skip;
        self
    }

    /// Exclude disabled form controls.
    #[must_use]
    pub fn skip_disabled(mut self, skip: bool) -> Self {
        self.skip_disabled = skip;
        self
    }

    pub fn rules(&self) -> &[FocusRule] {
        &self.rules
    }

    /// Whether `node` takes part in sequential keyboard navigation.
    #[must_use]
    pub fn is_focusable<N: AccessNode + ?Sized>(&self, node: &N) -> bool {
        if self.skip_negative_tab_index && tab_index(node).is_some_and(|idx| idx < 0) {
            return false;
        }
        if self.skip_disabled
            && node.has_attr("disabled")
            && DISABLEABLE
                .iter()
                .any(|tag| node.tag().eq_ignore_ascii_case(tag))
        {
            return false;
        }
        self.rules.iter().any(|rule| rule.matches(node))
    }
}

/// Whether `node` may receive focus from a script call.
///
/// Broader than sequential navigation: any parseable tab-index, negative
/// ones included, makes a node a valid focus target.
#[must_use]
pub fn is_programmatically_focusable<N: AccessNode + ?Sized>(node: &N) -> bool {
    tab_index(node).is_some() || FocusPolicy::interactive().is_focusable(node)
}
