//! Per-operation authorization decisions for officer and report mutations.
//!
//! # Purpose
//! Turns a resolved caller plus a [`Mutation`] into an allow/deny decision
//! with a specific [`DenyReason`].
//!
//! # Key invariants
//! - An unresolved caller yields [`AuthzError::CallerNotFound`] before any
//!   rank rule is evaluated.
//! - Rules are evaluated in a fixed order and the first failing rule wins.
//! - Password changes on another officer's record are always denied.
//!
//! # Common pitfalls
//! - Target existence is not checked here. The service looks the target up
//!   after the caller is resolved and before calling [`MutationAuthorizer::authorize`]
//!   for officer updates.
use crate::{AuthzError, AuthzResult, DenyReason, Identity, PermissionEvaluator, Rank};

/// Minimum rank for administrative actions.
pub const ADMIN_THRESHOLD: Rank = Rank::SubCommand;

/// A mutating operation, described only by what the rules need to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation<'a> {
    CreateOfficer,
    DeleteOfficer,
    UpdateOfficer {
        /// Phone of the officer record being edited.
        target_phone: &'a str,
        /// Rank requested in the update, if any.
        rank: Option<Rank>,
        sets_password: bool,
    },
    CreateReport,
    UpdateReport,
    DeleteReport,
}

impl Mutation<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::CreateOfficer => "create_officer",
            Mutation::DeleteOfficer => "delete_officer",
            Mutation::UpdateOfficer { .. } => "update_officer",
            Mutation::CreateReport => "create_report",
            Mutation::UpdateReport => "update_report",
            Mutation::DeleteReport => "delete_report",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MutationAuthorizer {
    evaluator: PermissionEvaluator,
    threshold: Rank,
}

impl MutationAuthorizer {
    pub fn new(evaluator: PermissionEvaluator) -> Self {
        Self {
            evaluator,
            threshold: ADMIN_THRESHOLD,
        }
    }

    /// Decide whether `caller` may perform `mutation`.
    ///
    /// # Returns
    /// - The resolved caller when the mutation is allowed.
    ///
    /// # Errors
    /// - `CallerNotFound` when `caller` is `None`.
    /// - `Forbidden` with the first rule that failed.
    pub fn authorize<'c>(
        &self,
        caller: Option<&'c Identity>,
        mutation: &Mutation<'_>,
    ) -> AuthzResult<&'c Identity> {
        let caller = caller.ok_or(AuthzError::CallerNotFound)?;
        match *mutation {
            Mutation::CreateOfficer | Mutation::DeleteOfficer | Mutation::DeleteReport => {
                self.require_threshold(caller)?;
            }
            Mutation::CreateReport | Mutation::UpdateReport => {}
            Mutation::UpdateOfficer {
                target_phone,
                rank,
                sets_password,
            } => {
                if target_phone != caller.phone {
                    self.require_threshold(caller)?;
                    if sets_password {
                        return Err(AuthzError::Forbidden(DenyReason::PasswordChangeForOther));
                    }
                }
                if let Some(requested) = rank {
                    if requested != caller.rank
                        && !self.evaluator.satisfies(caller.rank, self.threshold)
                    {
                        return Err(AuthzError::Forbidden(DenyReason::RankChangeBelowThreshold {
                            requested,
                            required: self.threshold,
                        }));
                    }
                }
            }
        }
        Ok(caller)
    }

    fn require_threshold(&self, caller: &Identity) -> AuthzResult<()> {
        if self.evaluator.satisfies(caller.rank, self.threshold) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(DenyReason::BelowThreshold {
                required: self.threshold,
                actual: caller.rank,
            }))
        }
    }
}
