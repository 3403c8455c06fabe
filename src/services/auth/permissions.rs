//! Permission inheritance.
//!
//! A `PermissionHierarchy` maps a grantor permission to the permissions it
//! implies. It is loaded once at startup, must be acyclic, and is read-only
//! afterwards; `PermissionResolver` answers closure and capability queries
//! over it without locking.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;
use tracing::warn;

pub const USER_READ: &str = "user:read";
pub const USER_WRITE: &str = "user:write";
pub const USER_DELETE: &str = "user:delete";

pub const ORG_READ: &str = "organization:read";
pub const ORG_WRITE: &str = "organization:write";
pub const ORG_DELETE: &str = "organization:delete";
pub const ORG_ADMIN: &str = "organization:admin";

pub const AGENT_READ: &str = "agent:read";
pub const AGENT_WRITE: &str = "agent:write";
pub const AGENT_DELETE: &str = "agent:delete";
pub const AGENT_EXECUTE: &str = "agent:execute";

pub const SYSTEM_ADMIN: &str = "system:admin";
pub const SYSTEM_READ: &str = "system:read";

#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("permission hierarchy contains a cycle through '{0}'")]
    Cycle(String),
    #[error("invalid permission hierarchy json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionHierarchy {
    grants: BTreeMap<String, BTreeSet<String>>,
}

impl PermissionHierarchy {
    pub fn new(grants: BTreeMap<String, BTreeSet<String>>) -> Result<Self, HierarchyError> {
        if let Some(node) = find_cycle(&grants) {
            return Err(HierarchyError::Cycle(node));
        }
        Ok(Self { grants })
    }

    /// `{"grantor": ["implied", ...], ...}`
    pub fn from_json(raw: &str) -> Result<Self, HierarchyError> {
        let grants: BTreeMap<String, BTreeSet<String>> = serde_json::from_str(raw)?;
        Self::new(grants)
    }

    /// The table the services ship with: system admins hold everything,
    /// organization admins manage users and agents inside their organization.
    pub fn builtin() -> Self {
        let system_admin = [
            USER_READ,
            USER_WRITE,
            USER_DELETE,
            ORG_READ,
            ORG_WRITE,
            ORG_DELETE,
            ORG_ADMIN,
            AGENT_READ,
            AGENT_WRITE,
            AGENT_DELETE,
            AGENT_EXECUTE,
            SYSTEM_READ,
        ];
        let org_admin = [
            USER_READ,
            USER_WRITE,
            ORG_READ,
            ORG_WRITE,
            AGENT_READ,
            AGENT_WRITE,
            AGENT_EXECUTE,
        ];

        let grants = BTreeMap::from([
            (
                SYSTEM_ADMIN.to_string(),
                system_admin.iter().map(|p| p.to_string()).collect(),
            ),
            (
                ORG_ADMIN.to_string(),
                org_admin.iter().map(|p| p.to_string()).collect(),
            ),
        ]);

        Self { grants }
    }

    pub fn implied_by(&self, permission: &str) -> Option<&BTreeSet<String>> {
        self.grants.get(permission)
    }

    pub fn grantor_count(&self) -> usize {
        self.grants.len()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

fn find_cycle(grants: &BTreeMap<String, BTreeSet<String>>) -> Option<String> {
    fn visit<'a>(
        node: &'a str,
        grants: &'a BTreeMap<String, BTreeSet<String>>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> Option<String> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => return Some(node.to_string()),
            None => {}
        }

        marks.insert(node, Mark::Visiting);
        if let Some(children) = grants.get(node) {
            for child in children {
                if let Some(found) = visit(child.as_str(), grants, marks) {
                    return Some(found);
                }
            }
        }
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks = HashMap::new();
    grants
        .keys()
        .find_map(|grantor| visit(grantor.as_str(), grants, &mut marks))
}

#[derive(Debug, Clone)]
pub struct PermissionResolver {
    hierarchy: PermissionHierarchy,
    max_rounds: usize,
}

impl PermissionResolver {
    pub fn new(hierarchy: PermissionHierarchy) -> Self {
        // An acyclic table is at most `grantor_count` levels deep.
        let max_rounds = hierarchy.grantor_count() + 1;
        Self {
            hierarchy,
            max_rounds,
        }
    }

    /// The declared permissions plus everything they imply, transitively.
    pub fn close<S: AsRef<str>>(
        &self,
        user_permissions: impl IntoIterator<Item = S>,
    ) -> BTreeSet<String> {
        let mut closed: BTreeSet<String> = user_permissions
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        let mut frontier: Vec<String> = closed.iter().cloned().collect();

        for _ in 0..self.max_rounds {
            let mut next = Vec::new();
            for permission in &frontier {
                if let Some(implied) = self.hierarchy.implied_by(permission) {
                    for p in implied {
                        if closed.insert(p.clone()) {
                            next.push(p.clone());
                        }
                    }
                }
            }
            if next.is_empty() {
                return closed;
            }
            frontier = next;
        }

        warn!(
            rounds = self.max_rounds,
            "permission closure stopped at the iteration cap"
        );
        closed
    }

    pub fn has<S: AsRef<str>>(
        &self,
        user_permissions: impl IntoIterator<Item = S>,
        required: &str,
    ) -> bool {
        self.close(user_permissions).contains(required)
    }

    pub fn has_all<S: AsRef<str>, R: AsRef<str>>(
        &self,
        user_permissions: impl IntoIterator<Item = S>,
        required: impl IntoIterator<Item = R>,
    ) -> bool {
        let closed = self.close(user_permissions);
        required.into_iter().all(|r| closed.contains(r.as_ref()))
    }

    pub fn has_any<S: AsRef<str>, R: AsRef<str>>(
        &self,
        user_permissions: impl IntoIterator<Item = S>,
        required: impl IntoIterator<Item = R>,
    ) -> bool {
        let closed = self.close(user_permissions);
        required.into_iter().any(|r| closed.contains(r.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
        entries
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    fn builtin() -> PermissionResolver {
        PermissionResolver::new(PermissionHierarchy::builtin())
    }

    #[test]
    fn builtin_table_is_acyclic() {
        let h = PermissionHierarchy::builtin();
        assert_eq!(PermissionHierarchy::new(h.grants.clone()).unwrap(), h);
    }

    #[test]
    fn system_admin_implies_everything() {
        let closed = builtin().close([SYSTEM_ADMIN]);
        for p in [USER_DELETE, ORG_ADMIN, AGENT_EXECUTE, SYSTEM_READ] {
            assert!(closed.contains(p), "missing {p}");
        }
        assert!(closed.contains(SYSTEM_ADMIN));
    }

    #[test]
    fn org_admin_does_not_get_destructive_permissions() {
        let r = builtin();
        assert!(r.has([ORG_ADMIN], USER_WRITE));
        assert!(!r.has([ORG_ADMIN], USER_DELETE));
        assert!(!r.has([ORG_ADMIN], SYSTEM_READ));
    }

    #[test]
    fn permissions_without_grants_are_kept_as_is() {
        let closed = builtin().close(["user:read", "custom:thing"]);
        assert_eq!(
            closed,
            BTreeSet::from(["user:read".to_string(), "custom:thing".to_string()])
        );
    }

    #[test]
    fn multi_level_grants_are_followed_to_a_fixed_point() {
        let h = PermissionHierarchy::new(table(&[
            ("a", &["b"]),
            ("b", &["c"]),
            ("c", &["d", "e"]),
        ]))
        .unwrap();
        let r = PermissionResolver::new(h);

        let closed = r.close(["a"]);
        assert_eq!(closed.len(), 5);
        assert!(r.has_all(["a"], ["d", "e"]));
    }

    #[test]
    fn closure_contains_its_input_and_satisfies_itself() {
        let r = builtin();
        let inputs: [&[&str]; 4] = [
            &[],
            &[USER_READ],
            &[ORG_ADMIN, "custom:x"],
            &[SYSTEM_ADMIN, AGENT_READ],
        ];

        for input in inputs {
            let closed = r.close(input.iter().copied());
            assert!(input.iter().all(|p| closed.contains(*p)));
            assert!(r.has_all(input.iter().copied(), &closed));
            assert_eq!(r.close(&closed), closed);
        }
    }

    #[test]
    fn has_all_and_has_any_edge_cases() {
        let r = builtin();
        let none: [&str; 0] = [];

        assert!(r.has_all([USER_READ], none));
        assert!(!r.has_any([USER_READ], none));
        assert!(r.has_any([ORG_ADMIN], [USER_DELETE, AGENT_READ]));
        assert!(!r.has_all([ORG_ADMIN], [USER_DELETE, AGENT_READ]));
    }

    #[test]
    fn cycles_are_rejected() {
        let err = PermissionHierarchy::new(table(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]))
            .unwrap_err();
        assert!(matches!(err, HierarchyError::Cycle(_)));
    }

    #[test]
    fn self_grant_is_a_cycle() {
        let err = PermissionHierarchy::new(table(&[("a", &["a"])])).unwrap_err();
        assert!(matches!(err, HierarchyError::Cycle(node) if node == "a"));
    }

    #[test]
    fn diamonds_are_not_cycles() {
        let h = PermissionHierarchy::new(table(&[
            ("top", &["left", "right"]),
            ("left", &["bottom"]),
            ("right", &["bottom"]),
        ]));
        assert!(h.is_ok());
    }

    #[test]
    fn hierarchy_loads_from_json() {
        let h = PermissionHierarchy::from_json(r#"{"report:admin": ["report:read", "report:write"]}"#)
            .unwrap();
        let r = PermissionResolver::new(h);
        assert!(r.has(["report:admin"], "report:write"));

        assert!(matches!(
            PermissionHierarchy::from_json("[1, 2]"),
            Err(HierarchyError::Json(_))
        ));
        assert!(matches!(
            PermissionHierarchy::from_json(r#"{"x": ["x"]}"#),
            Err(HierarchyError::Cycle(_))
        ));
    }
}
