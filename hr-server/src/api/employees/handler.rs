//! Employee API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use shared::models::{Employee, EmployeeStats, LeaveBalanceView, Profile, UserStatus};
use shared::{ApiResponse, AppError, AppResult, ErrorCode, PageQuery, PaginatedResponse};
use validator::Validate;

use crate::AppState;
use crate::auth::password::generate_temp_password;
use crate::auth::{CurrentUser, Permission, SystemRole};
use crate::db::UserFilter;
use crate::departments;
use crate::employees::{self, NewEmployee};
use crate::leave::service as leave_service;
use crate::utils::time::business_date;
use crate::utils::serde_helpers;
use crate::utils::validation::validate_body;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<UserStatus>,
    pub department_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetail {
    #[serde(flatten)]
    pub employee: Employee,
    pub leave_balances: Vec<LeaveBalanceView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEmployee {
    pub employee: Employee,
    /// Shown once; only the hash is stored
    pub temporary_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 3, max = 50, message = "Employee ID must be at least 3 characters"))]
    pub employee_id: String,
    #[serde(deserialize_with = "serde_helpers::email")]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 2, max = 100, message = "First name must be at least 2 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 100, message = "Last name must be at least 2 characters"))]
    pub last_name: String,
    /// Defaults to the Employee role
    pub role_id: Option<String>,
    pub department_id: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    #[validate(range(min = 0.0, message = "Salary must not be negative"))]
    pub salary: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 3, max = 50, message = "Employee ID must be at least 3 characters"))]
    pub employee_id: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::opt_email")]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub role_id: Option<String>,
    pub department_id: Option<String>,
    pub status: Option<UserStatus>,
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: ProfileUpdate,
}

/// Profile fields; employment fields need `employees.update`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 2, max = 100, message = "First name must be at least 2 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 2, max = 100, message = "Last name must be at least 2 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 1000))]
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 1000))]
    pub emergency_contact: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    #[validate(range(min = 0.0, message = "Salary must not be negative"))]
    pub salary: Option<f64>,
}

impl ProfileUpdate {
    fn touches_employment(&self) -> bool {
        self.position.is_some() || self.hire_date.is_some() || self.salary.is_some()
    }

    fn apply(self, profile: &mut Profile) {
        if let Some(v) = self.first_name {
            profile.first_name = v;
        }
        if let Some(v) = self.last_name {
            profile.last_name = v;
        }
        if self.phone.is_some() {
            profile.phone = self.phone;
        }
        if self.address.is_some() {
            profile.address = self.address;
        }
        if self.date_of_birth.is_some() {
            profile.date_of_birth = self.date_of_birth;
        }
        if self.emergency_contact.is_some() {
            profile.emergency_contact = self.emergency_contact;
        }
        if self.position.is_some() {
            profile.position = self.position;
        }
        if self.hire_date.is_some() {
            profile.hire_date = self.hire_date;
        }
        if self.salary.is_some() {
            profile.salary = self.salary;
        }
    }
}

/// List employees (search, status, departmentId; newest first)
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Employee>>>> {
    let filter = UserFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        status: query.status,
        department_id: query.department_id.filter(|s| !s.is_empty()),
        ..Default::default()
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let employees = employees::list(state.store(), &filter, page).await?;
    Ok(Json(ApiResponse::success(employees)))
}

/// Get employee by id, with this year's leave balances
pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<EmployeeDetail>>> {
    user.require_self_or(&id, Permission::EmployeesRead)?;
    let record = employees::find_record(state.store(), &id).await?;
    let year = business_date(state.now(), state.config.business_timezone).year();
    let leave_balances = leave_service::balances(state.store(), Some(&id), year).await?;
    let employee = employees::view(state.store(), record).await?;
    Ok(Json(ApiResponse::success(EmployeeDetail {
        employee,
        leave_balances,
    })))
}

/// Create an employee with a generated temporary password
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateEmployeeRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedEmployee>>)> {
    validate_body(&req)?;

    let role = match &req.role_id {
        Some(role_id) => state.store.find_role(role_id).await?,
        None => state.store.find_role_by_name(SystemRole::DEFAULT.name()).await?,
    }
    .ok_or_else(|| AppError::new(ErrorCode::RoleNotFound))?;
    user.require_can_grant(&role)?;

    let temporary_password = generate_temp_password();
    let record = employees::create_employee(
        state.store(),
        NewEmployee {
            employee_id: req.employee_id,
            email: req.email,
            password: temporary_password.clone(),
            role_id: role.id,
            department_id: req.department_id,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            position: req.position,
            hire_date: req.hire_date,
            salary: req.salary,
        },
        state.now().timestamp_millis(),
    )
    .await?;
    tracing::info!(user_id = %record.user.id, created_by = %user.id, "Employee created");

    let employee = employees::view(state.store(), record).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Employee created successfully",
            CreatedEmployee {
                employee,
                temporary_password,
            },
        )),
    ))
}

/// Update user and profile fields
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> AppResult<Json<ApiResponse<Employee>>> {
    validate_body(&req)?;
    let mut record = employees::find_record(state.store(), &id).await?;

    if let Some(role_id) = req.role_id {
        let role = state
            .store
            .find_role(&role_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::RoleNotFound))?;
        user.require_assignable(&id, &role)?;
        record.user.role_id = role.id;
    }
    if let Some(status) = req.status {
        if id == user.id && !status.is_active() {
            return Err(AppError::new(ErrorCode::EmployeeCannotDeleteSelf));
        }
        record.user.status = status;
    }
    if let Some(employee_id) = req.employee_id {
        record.user.employee_id = employee_id.trim().to_string();
    }
    if let Some(email) = req.email {
        record.user.email = email;
    }
    if let Some(department_id) = req.department_id {
        departments::ensure_exists(state.store(), Some(&department_id)).await?;
        record.user.department_id = Some(department_id);
    }
    req.profile.apply(&mut record.profile);
    record.user.updated_at = state.now().timestamp_millis();

    employees::save(state.store(), &record).await?;
    tracing::info!(user_id = %id, updated_by = %user.id, "Employee updated");

    let employee = employees::view(state.store(), record).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Employee updated successfully",
        employee,
    )))
}

/// Soft delete (status → INACTIVE)
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    employees::deactivate(state.store(), &user.id, &id, state.now().timestamp_millis()).await?;
    Ok(Json(ApiResponse::message("Employee deactivated successfully")))
}

pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    user.require_self_or(&id, Permission::EmployeesRead)?;
    let record = employees::find_record(state.store(), &id).await?;
    Ok(Json(ApiResponse::success(record.profile)))
}

/// Self-service edit of personal fields; employment fields need `employees.update`
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<ProfileUpdate>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    validate_body(&req)?;
    user.require_self_or(&id, Permission::EmployeesUpdate)?;
    if req.touches_employment() && !user.has_permission(Permission::EmployeesUpdate) {
        return Err(AppError::permission_denied(
            "Position, hire date and salary require employees.update",
        ));
    }

    let mut record = employees::find_record(state.store(), &id).await?;
    req.apply(&mut record.profile);
    record.user.updated_at = state.now().timestamp_millis();
    employees::save(state.store(), &record).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Profile updated successfully",
        record.profile,
    )))
}

pub async fn stats(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<EmployeeStats>>> {
    user.require_self_or(&id, Permission::EmployeesRead)?;
    employees::find_record(state.store(), &id).await?;
    let stats = employees::stats(
        state.store(),
        &id,
        state.now(),
        state.config.business_timezone,
    )
    .await?;
    Ok(Json(ApiResponse::success(stats)))
}
