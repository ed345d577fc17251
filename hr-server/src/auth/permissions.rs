//! Permission Definitions
//!
//! Typed RBAC permission model.
//!
//! ## 设计原则
//! - 权限令牌为 `模块.操作` 形式 (如 `leave.approve`)
//! - `*` 是独立的 [`PermissionSet::All`] 变体，不是字符串哨兵
//! - 系统角色 ([`SystemRole`]) 提供默认权限集合，启动时写入角色表

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Wildcard token granting every permission
pub const WILDCARD: &str = "*";

/// A granular capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    UsersCreate,
    UsersRead,
    UsersUpdate,
    UsersDelete,
    EmployeesCreate,
    EmployeesRead,
    EmployeesUpdate,
    EmployeesDelete,
    ProfileRead,
    ProfileUpdate,
    AttendanceRead,
    AttendanceManage,
    AttendanceClock,
    LeaveRead,
    LeaveRequest,
    LeaveApprove,
    PerformanceRead,
    PerformanceManage,
    RecruitmentRead,
    RecruitmentManage,
    ReportsRead,
    ReportsGenerate,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Self::UsersCreate,
        Self::UsersRead,
        Self::UsersUpdate,
        Self::UsersDelete,
        Self::EmployeesCreate,
        Self::EmployeesRead,
        Self::EmployeesUpdate,
        Self::EmployeesDelete,
        Self::ProfileRead,
        Self::ProfileUpdate,
        Self::AttendanceRead,
        Self::AttendanceManage,
        Self::AttendanceClock,
        Self::LeaveRead,
        Self::LeaveRequest,
        Self::LeaveApprove,
        Self::PerformanceRead,
        Self::PerformanceManage,
        Self::RecruitmentRead,
        Self::RecruitmentManage,
        Self::ReportsRead,
        Self::ReportsGenerate,
    ];

    /// Acts only on the holder's own records
    pub fn is_self_service(&self) -> bool {
        matches!(
            self,
            Self::ProfileRead | Self::ProfileUpdate | Self::AttendanceClock | Self::LeaveRequest
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UsersCreate => "users.create",
            Self::UsersRead => "users.read",
            Self::UsersUpdate => "users.update",
            Self::UsersDelete => "users.delete",
            Self::EmployeesCreate => "employees.create",
            Self::EmployeesRead => "employees.read",
            Self::EmployeesUpdate => "employees.update",
            Self::EmployeesDelete => "employees.delete",
            Self::ProfileRead => "profile.read",
            Self::ProfileUpdate => "profile.update",
            Self::AttendanceRead => "attendance.read",
            Self::AttendanceManage => "attendance.manage",
            Self::AttendanceClock => "attendance.clock",
            Self::LeaveRead => "leave.read",
            Self::LeaveRequest => "leave.request",
            Self::LeaveApprove => "leave.approve",
            Self::PerformanceRead => "performance.read",
            Self::PerformanceManage => "performance.manage",
            Self::RecruitmentRead => "recruitment.read",
            Self::RecruitmentManage => "recruitment.manage",
            Self::ReportsRead => "reports.read",
            Self::ReportsGenerate => "reports.generate",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown permission token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// Resolved permission set of an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionSet {
    /// Wildcard: every permission
    All,
    Only(BTreeSet<Permission>),
}

impl PermissionSet {
    /// Build from stored role tokens. Any `*` yields [`PermissionSet::All`];
    /// unknown tokens are dropped.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut set = BTreeSet::new();
        for token in tokens {
            let token = token.as_ref();
            if token == WILDCARD {
                return Self::All;
            }
            match token.parse::<Permission>() {
                Ok(p) => {
                    set.insert(p);
                }
                Err(e) => tracing::warn!(token, "Ignoring role permission: {e}"),
            }
        }
        Self::Only(set)
    }

    pub fn contains(&self, permission: Permission) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(&permission),
        }
    }

    /// Every administrative permission in `other` is also in `self`
    ///
    /// Self-service permissions are ignored. A finite set never covers the
    /// wildcard.
    pub fn covers(&self, other: &PermissionSet) -> bool {
        match (self, other) {
            (Self::All, _) => true,
            (Self::Only(_), Self::All) => false,
            (Self::Only(mine), Self::Only(theirs)) => theirs
                .iter()
                .all(|p| p.is_self_service() || mine.contains(p)),
        }
    }

    /// Wire form (`["*"]` for the wildcard)
    pub fn to_tokens(&self) -> Vec<String> {
        match self {
            Self::All => vec![WILDCARD.to_string()],
            Self::Only(set) => set.iter().map(|p| p.as_str().to_string()).collect(),
        }
    }
}

/// Provisioned system roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemRole {
    Administrator,
    HrManager,
    Manager,
    Employee,
}

impl SystemRole {
    pub const ALL: &'static [SystemRole] = &[
        Self::Administrator,
        Self::HrManager,
        Self::Manager,
        Self::Employee,
    ];

    /// Role assigned when registration names none
    pub const DEFAULT: SystemRole = SystemRole::Employee;

    pub fn name(&self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::HrManager => "HR Manager",
            Self::Manager => "Manager",
            Self::Employee => "Employee",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Administrator => "Full system access",
            Self::HrManager => "Human resources management",
            Self::Manager => "Team management and approvals",
            Self::Employee => "Self-service access",
        }
    }

    /// Default permission tokens written to the role table
    pub fn default_permissions(&self) -> Vec<String> {
        use Permission::*;
        let granted: &[Permission] = match self {
            Self::Administrator => {
                let mut tokens: Vec<String> =
                    Permission::ALL.iter().map(|p| p.as_str().to_string()).collect();
                tokens.push(WILDCARD.to_string());
                return tokens;
            }
            Self::HrManager => &[
                EmployeesCreate,
                EmployeesRead,
                EmployeesUpdate,
                AttendanceRead,
                LeaveRead,
                LeaveApprove,
                PerformanceRead,
                PerformanceManage,
                RecruitmentRead,
                RecruitmentManage,
                ReportsRead,
                ReportsGenerate,
            ],
            Self::Manager => &[
                EmployeesRead,
                AttendanceRead,
                LeaveRead,
                LeaveApprove,
                PerformanceRead,
                PerformanceManage,
                ReportsRead,
            ],
            Self::Employee => &[
                ProfileRead,
                ProfileUpdate,
                AttendanceRead,
                AttendanceClock,
                LeaveRead,
                LeaveRequest,
                PerformanceRead,
            ],
        };
        granted.iter().map(|p| p.as_str().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_grants_everything() {
        let set = PermissionSet::from_tokens(&["*"]);
        assert_eq!(set, PermissionSet::All);
        for p in Permission::ALL {
            assert!(set.contains(*p), "{p}");
        }
    }

    #[test]
    fn test_exact_match_required_without_wildcard() {
        let set = PermissionSet::from_tokens(&["leave.read", "leave.request"]);
        assert!(set.contains(Permission::LeaveRead));
        assert!(!set.contains(Permission::LeaveApprove));
        assert!(!set.contains(Permission::ReportsRead));
    }

    #[test]
    fn test_unknown_tokens_dropped() {
        let set = PermissionSet::from_tokens(&["leave.read", "payroll:run", "leave.*"]);
        assert_eq!(
            set,
            PermissionSet::Only(BTreeSet::from([Permission::LeaveRead]))
        );
    }

    #[test]
    fn test_covers() {
        let admin = PermissionSet::from_tokens(&SystemRole::Administrator.default_permissions());
        let hr = PermissionSet::from_tokens(&SystemRole::HrManager.default_permissions());
        let manager = PermissionSet::from_tokens(&SystemRole::Manager.default_permissions());
        let employee = PermissionSet::from_tokens(&SystemRole::Employee.default_permissions());

        assert!(admin.covers(&hr));
        assert!(admin.covers(&admin));
        assert!(!hr.covers(&admin));
        assert!(hr.covers(&hr));
        assert!(hr.covers(&manager));
        // attendance.clock and friends are self-service
        assert!(hr.covers(&employee));
        assert!(!manager.covers(&hr));
        assert!(!employee.covers(&manager));
        assert!(employee.covers(&PermissionSet::Only(BTreeSet::new())));
    }

    #[test]
    fn test_permission_parse_round_trip() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>(), Ok(*p));
        }
        assert!("leave.destroy".parse::<Permission>().is_err());
    }

    #[test]
    fn test_system_role_defaults() {
        let employee = PermissionSet::from_tokens(&SystemRole::Employee.default_permissions());
        assert!(employee.contains(Permission::AttendanceClock));
        assert!(!employee.contains(Permission::LeaveApprove));

        let manager = PermissionSet::from_tokens(&SystemRole::Manager.default_permissions());
        assert!(manager.contains(Permission::LeaveApprove));

        let admin = PermissionSet::from_tokens(&SystemRole::Administrator.default_permissions());
        assert_eq!(admin, PermissionSet::All);

        assert_eq!(SystemRole::from_name("HR Manager"), Some(SystemRole::HrManager));
        assert_eq!(SystemRole::from_name("hr manager"), None);
    }
}
