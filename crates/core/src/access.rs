//! Access policy: who may do what, and to which regions.
//!
//! Authorization is an ordered chain of [`AccessRule`]s evaluated against a
//! [`RequestContext`]. The first rule that denies wins. The chain performs no
//! I/O; callers fetch any target record first and pass its region in.

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;
use crate::incident::FireIncident;
use crate::regions::RegionCatalog;
use crate::roles::{Role, RoleSet};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Principal and actions
// ---------------------------------------------------------------------------

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: DbId,
    pub username: String,
    pub roles: RoleSet,
    /// Region the user is assigned to.
    pub region: String,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }
}

/// Operations guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ViewSummary,
    ListRecords,
    ViewRecord,
    CreateRecord,
    EditRecord,
    DeleteRecord,
    ViewAudit,
    ExportAudit,
    ManageUsers,
    ListLocations,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::ViewSummary => "view_summary",
            Action::ListRecords => "list_records",
            Action::ViewRecord => "view_record",
            Action::CreateRecord => "create_record",
            Action::EditRecord => "edit_record",
            Action::DeleteRecord => "delete_record",
            Action::ViewAudit => "view_audit",
            Action::ExportAudit => "export_audit",
            Action::ManageUsers => "manage_users",
            Action::ListLocations => "list_locations",
        }
    }

    /// Roles that may perform the action at all.
    pub fn allowed_roles(self) -> &'static [Role] {
        use Role::*;
        match self {
            Action::ViewSummary => &[Admin, Engineer, Analyst, Operator],
            Action::ListRecords | Action::ViewRecord => &[Admin, Engineer, Analyst],
            Action::CreateRecord => &[Admin, Engineer, Operator],
            Action::EditRecord => &[Admin, Engineer],
            Action::DeleteRecord
            | Action::ViewAudit
            | Action::ExportAudit
            | Action::ManageUsers => &[Admin],
            Action::ListLocations => &[Admin, Engineer, Operator],
        }
    }

    /// Roles that may perform the action only inside their own region.
    pub fn region_scoped_roles(self) -> &'static [Role] {
        use Role::*;
        match self {
            Action::ViewSummary
            | Action::ListRecords
            | Action::ViewRecord
            | Action::EditRecord => &[Engineer],
            Action::CreateRecord => &[Engineer, Operator],
            _ => &[],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when every role that grants `action` to `principal` is region scoped.
fn is_region_scoped(principal: &Principal, action: Action) -> bool {
    let scoped = action.region_scoped_roles();
    !action
        .allowed_roles()
        .iter()
        .any(|role| !scoped.contains(role) && principal.has_role(*role))
}

// ---------------------------------------------------------------------------
// Rule chain
// ---------------------------------------------------------------------------

/// What a rule sees when it is evaluated.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    pub principal: &'a Principal,
    pub action: Action,
    /// Regions the request touches. An edit that moves a record names both.
    pub target_regions: Vec<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn new(principal: &'a Principal, action: Action) -> Self {
        Self {
            principal,
            action,
            target_regions: Vec::new(),
        }
    }

    pub fn with_region(mut self, region: &'a str) -> Self {
        if !self.target_regions.contains(&region) {
            self.target_regions.push(region);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

/// One link of the authorization chain.
pub trait AccessRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, ctx: &RequestContext<'_>) -> Decision;
}

/// Users without any role can do nothing.
#[derive(Debug, Default)]
pub struct HasAnyRole;

impl AccessRule for HasAnyRole {
    fn name(&self) -> &'static str {
        "has_any_role"
    }

    fn evaluate(&self, ctx: &RequestContext<'_>) -> Decision {
        if ctx.principal.roles.is_empty() {
            Decision::Deny("No roles are assigned to this account".into())
        } else {
            Decision::Allow
        }
    }
}

/// One of the principal's roles must be allowed to perform the action.
#[derive(Debug, Default)]
pub struct RoleGrantsAction;

impl AccessRule for RoleGrantsAction {
    fn name(&self) -> &'static str {
        "role_grants_action"
    }

    fn evaluate(&self, ctx: &RequestContext<'_>) -> Decision {
        let allowed = ctx.action.allowed_roles();
        if ctx.principal.roles.intersects(allowed) {
            return Decision::Allow;
        }
        let names: Vec<&str> = allowed.iter().map(|r| r.as_str()).collect();
        Decision::Deny(format!(
            "Action '{}' requires one of the roles: {}",
            ctx.action,
            names.join(", ")
        ))
    }
}

/// Region-scoped roles may only touch their own region.
#[derive(Debug, Default)]
pub struct RegionScope;

impl AccessRule for RegionScope {
    fn name(&self) -> &'static str {
        "region_scope"
    }

    fn evaluate(&self, ctx: &RequestContext<'_>) -> Decision {
        if !is_region_scoped(ctx.principal, ctx.action) {
            return Decision::Allow;
        }
        match ctx
            .target_regions
            .iter()
            .find(|r| **r != ctx.principal.region)
        {
            Some(region) => Decision::Deny(format!(
                "Access denied: you may only {} in region '{}', not '{region}'",
                ctx.action, ctx.principal.region
            )),
            None => Decision::Allow,
        }
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// An ordered list of rules, built once at startup.
pub struct AccessPolicy {
    rules: Vec<Box<dyn AccessRule>>,
}

impl fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.rules.iter().map(|r| r.name()).collect();
        f.debug_struct("AccessPolicy").field("rules", &names).finish()
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl AccessPolicy {
    /// An empty chain allows everything.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// roles present → role grants action → region scope.
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(HasAnyRole)
            .with_rule(RoleGrantsAction)
            .with_rule(RegionScope)
    }

    pub fn with_rule(mut self, rule: impl AccessRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn evaluate(&self, ctx: &RequestContext<'_>) -> Decision {
        for rule in &self.rules {
            if let Decision::Deny(reason) = rule.evaluate(ctx) {
                tracing::debug!(
                    rule = rule.name(),
                    action = %ctx.action,
                    user_id = ctx.principal.user_id,
                    "Access denied"
                );
                return Decision::Deny(reason);
            }
        }
        Decision::Allow
    }

    /// Evaluate the chain, mapping a denial to [`CoreError::Forbidden`].
    pub fn authorize(&self, ctx: &RequestContext<'_>) -> Result<(), CoreError> {
        match self.evaluate(ctx) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(CoreError::Forbidden(reason)),
        }
    }

    /// Check `action`, scoped to `target`'s region when one is given.
    pub fn can_perform(
        &self,
        principal: &Principal,
        action: Action,
        target: Option<&FireIncident>,
    ) -> bool {
        let mut ctx = RequestContext::new(principal, action);
        if let Some(incident) = target {
            ctx = ctx.with_region(incident.region());
        }
        self.evaluate(&ctx) == Decision::Allow
    }

    /// Whether records of `region` are visible to `principal`.
    pub fn can_access_region(&self, principal: &Principal, region: &str) -> bool {
        !is_region_scoped(principal, Action::ViewSummary) || principal.region == region
    }

    /// Drop the records the principal is not allowed to see.
    pub fn visible_records(
        &self,
        principal: &Principal,
        records: Vec<FireIncident>,
    ) -> Vec<FireIncident> {
        records
            .into_iter()
            .filter(|r| self.can_access_region(principal, r.region()))
            .collect()
    }

    /// Regions the principal may pick when filing a record.
    pub fn selectable_regions<'c>(
        &self,
        principal: &Principal,
        catalog: &'c RegionCatalog,
    ) -> Vec<&'c str> {
        if is_region_scoped(principal, Action::CreateRecord) {
            catalog
                .all_regions()
                .into_iter()
                .filter(|r| *r == principal.region)
                .collect()
        } else {
            catalog.all_regions()
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::incident::tests::report;

    fn principal(roles: &[Role], region: &str) -> Principal {
        Principal {
            user_id: 7,
            username: "tester".into(),
            roles: roles.iter().copied().collect(),
            region: region.into(),
        }
    }

    fn fire(id: DbId, region: &str) -> FireIncident {
        FireIncident {
            id,
            report: report(region, "x"),
        }
    }

    fn sample_records() -> Vec<FireIncident> {
        vec![fire(1, "X"), fire(2, "Y"), fire(3, "X"), fire(4, "Z")]
    }

    // -----------------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------------

    #[test]
    fn engineer_only_sees_own_region() {
        let policy = AccessPolicy::standard();
        let engineer = principal(&[Role::Engineer], "X");
        let visible = policy.visible_records(&engineer, sample_records());
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|r| r.region() == "X"));
    }

    #[test]
    fn admin_and_analyst_see_everything() {
        let policy = AccessPolicy::standard();
        for role in [Role::Admin, Role::Analyst] {
            let p = principal(&[role], "X");
            assert_eq!(policy.visible_records(&p, sample_records()).len(), 4);
        }
    }

    #[test]
    fn extra_unscoped_role_lifts_engineer_scope() {
        let policy = AccessPolicy::standard();
        let p = principal(&[Role::Engineer, Role::Analyst], "X");
        assert!(policy.can_access_region(&p, "Y"));
        assert!(policy.can_perform(&p, Action::ViewRecord, Some(&fire(2, "Y"))));
        assert!(!policy.can_perform(&p, Action::EditRecord, Some(&fire(2, "Y"))));
    }

    // -----------------------------------------------------------------------
    // Role grants
    // -----------------------------------------------------------------------

    #[test]
    fn only_admin_deletes_and_exports() {
        let policy = AccessPolicy::standard();
        let target = fire(1, "X");
        for role in [Role::Engineer, Role::Analyst, Role::Operator] {
            let p = principal(&[role], "X");
            assert!(!policy.can_perform(&p, Action::DeleteRecord, Some(&target)));
            assert!(!policy.can_perform(&p, Action::ExportAudit, None));
        }
        let admin = principal(&[Role::Admin], "X");
        assert!(policy.can_perform(&admin, Action::DeleteRecord, Some(&target)));
        assert!(policy.can_perform(&admin, Action::ExportAudit, None));
    }

    #[test]
    fn analyst_is_read_only() {
        let policy = AccessPolicy::standard();
        let analyst = principal(&[Role::Analyst], "X");
        assert!(policy.can_perform(&analyst, Action::ViewSummary, None));
        assert!(policy.can_perform(&analyst, Action::ListRecords, None));
        assert!(!policy.can_perform(&analyst, Action::CreateRecord, None));
        assert!(!policy.can_perform(&analyst, Action::EditRecord, Some(&fire(1, "X"))));
    }

    #[test]
    fn operator_creates_in_own_region_only() {
        let policy = AccessPolicy::standard();
        let operator = principal(&[Role::Operator], "X");
        assert!(policy.can_perform(&operator, Action::CreateRecord, Some(&fire(0, "X"))));
        assert!(!policy.can_perform(&operator, Action::CreateRecord, Some(&fire(0, "Y"))));
        assert!(!policy.can_perform(&operator, Action::ListRecords, None));
    }

    #[test]
    fn engineer_edit_outside_region_is_forbidden() {
        let policy = AccessPolicy::standard();
        let engineer = principal(&[Role::Engineer], "X");
        let ctx = RequestContext::new(&engineer, Action::EditRecord).with_region("Y");
        assert_matches!(policy.authorize(&ctx), Err(CoreError::Forbidden(msg)) if msg.contains("'Y'"));
    }

    #[test]
    fn moving_a_record_checks_both_regions() {
        let policy = AccessPolicy::standard();
        let engineer = principal(&[Role::Engineer], "X");
        let ctx = RequestContext::new(&engineer, Action::EditRecord)
            .with_region("X")
            .with_region("Y");
        assert!(policy.authorize(&ctx).is_err());

        let stay = RequestContext::new(&engineer, Action::EditRecord)
            .with_region("X")
            .with_region("X");
        assert_eq!(stay.target_regions.len(), 1);
        assert!(policy.authorize(&stay).is_ok());
    }

    #[test]
    fn empty_role_set_is_denied_first() {
        let policy = AccessPolicy::standard();
        let nobody = principal(&[], "X");
        let ctx = RequestContext::new(&nobody, Action::ViewSummary);
        assert_eq!(
            policy.evaluate(&ctx),
            Decision::Deny("No roles are assigned to this account".into())
        );
    }

    // -----------------------------------------------------------------------
    // Chain composition
    // -----------------------------------------------------------------------

    struct DenyAll;

    impl AccessRule for DenyAll {
        fn name(&self) -> &'static str {
            "deny_all"
        }

        fn evaluate(&self, _ctx: &RequestContext<'_>) -> Decision {
            Decision::Deny("maintenance".into())
        }
    }

    #[test]
    fn extra_rules_run_after_standard_chain() {
        let policy = AccessPolicy::standard().with_rule(DenyAll);
        assert_eq!(
            policy.rule_names(),
            vec!["has_any_role", "role_grants_action", "region_scope", "deny_all"]
        );
        let admin = principal(&[Role::Admin], "X");
        let ctx = RequestContext::new(&admin, Action::ViewSummary);
        assert_eq!(policy.evaluate(&ctx), Decision::Deny("maintenance".into()));
    }

    #[test]
    fn empty_chain_allows() {
        let policy = AccessPolicy::empty();
        let nobody = principal(&[], "X");
        assert!(policy.can_perform(&nobody, Action::ManageUsers, None));
    }

    // -----------------------------------------------------------------------
    // Region choices
    // -----------------------------------------------------------------------

    #[test]
    fn selectable_regions_follow_scope() {
        let policy = AccessPolicy::standard();
        let catalog = RegionCatalog::builtin();
        let admin = principal(&[Role::Admin], "Область Абай");
        assert_eq!(policy.selectable_regions(&admin, &catalog).len(), 17);

        let operator = principal(&[Role::Operator], "Область Абай");
        assert_eq!(policy.selectable_regions(&operator, &catalog), vec!["Область Абай"]);
    }
}
