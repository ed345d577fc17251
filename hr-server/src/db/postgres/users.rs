use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{Profile, Role, User, UserStatus};
use shared::{PageQuery, PaginatedResponse};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

use super::{PgStore, corrupt};
use crate::db::{RepoError, RepoResult, UserFilter, UserRecord, UserStore};

const SELECT_USER: &str = "SELECT u.id, u.employee_id, u.email, u.password_hash, u.role_id, \
     u.department_id, u.status, u.created_at, u.updated_at, \
     p.first_name, p.last_name, p.phone, p.address, p.date_of_birth, p.position, \
     p.hire_date, p.salary, p.emergency_contact \
     FROM users u JOIN profiles p ON p.user_id = u.id";

const SELECT_ROLE: &str = "SELECT id, name, description, permissions, created_at FROM roles";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    employee_id: String,
    email: String,
    password_hash: String,
    role_id: String,
    department_id: Option<String>,
    status: String,
    created_at: i64,
    updated_at: i64,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    address: Option<String>,
    date_of_birth: Option<NaiveDate>,
    position: Option<String>,
    hire_date: Option<NaiveDate>,
    salary: Option<f64>,
    emergency_contact: Option<String>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = RepoError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status =
            UserStatus::from_db(&row.status).ok_or_else(|| corrupt("status", &row.status))?;
        Ok(UserRecord {
            profile: Profile {
                user_id: row.id.clone(),
                first_name: row.first_name,
                last_name: row.last_name,
                phone: row.phone,
                address: row.address,
                date_of_birth: row.date_of_birth,
                position: row.position,
                hire_date: row.hire_date,
                salary: row.salary,
                emergency_contact: row.emergency_contact,
            },
            user: User {
                id: row.id,
                employee_id: row.employee_id,
                email: row.email,
                role_id: row.role_id,
                department_id: row.department_id,
                status,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            password_hash: row.password_hash,
        })
    }
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a UserFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND u.status = ").push_bind(status.as_db());
    }
    if let Some(dept) = &filter.department_id {
        qb.push(" AND u.department_id = ").push_bind(dept);
    }
    if let Some(role_id) = &filter.role_id {
        qb.push(" AND u.role_id = ").push_bind(role_id);
    }
    if let Some(since) = filter.hired_since {
        qb.push(" AND p.hire_date >= ").push_bind(since);
    }
    if let Some(term) = &filter.search {
        let pattern = format!("%{}%", term.to_lowercase());
        qb.push(" AND (LOWER(u.employee_id) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(u.email) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(p.first_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(p.last_name) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: &str) -> RepoResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_USER} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRecord::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_USER} WHERE u.email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRecord::try_from).transpose()
    }

    async fn identity_exists(&self, email: &str, employee_id: &str) -> RepoResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 OR employee_id = $2)",
        )
        .bind(email)
        .bind(employee_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_user(&self, record: &UserRecord) -> RepoResult<()> {
        let user = &record.user;
        let profile = &record.profile;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (id, employee_id, email, password_hash, role_id, department_id, \
             status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&user.id)
        .bind(&user.employee_id)
        .bind(&user.email)
        .bind(&record.password_hash)
        .bind(&user.role_id)
        .bind(&user.department_id)
        .bind(user.status.as_db())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO profiles (user_id, first_name, last_name, phone, address, \
             date_of_birth, position, hire_date, salary, emergency_contact) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&user.id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(profile.date_of_birth)
        .bind(&profile.position)
        .bind(profile.hire_date)
        .bind(profile.salary)
        .bind(&profile.emergency_contact)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_user(&self, user: &User, profile: &Profile) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE users SET employee_id = $1, email = $2, role_id = $3, department_id = $4, \
             status = $5, updated_at = $6 WHERE id = $7",
        )
        .bind(&user.employee_id)
        .bind(&user.email)
        .bind(&user.role_id)
        .bind(&user.department_id)
        .bind(user.status.as_db())
        .bind(user.updated_at)
        .bind(&user.id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("user {}", user.id)));
        }

        sqlx::query(
            "UPDATE profiles SET first_name = $1, last_name = $2, phone = $3, address = $4, \
             date_of_birth = $5, position = $6, hire_date = $7, salary = $8, \
             emergency_contact = $9 WHERE user_id = $10",
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(profile.date_of_birth)
        .bind(&profile.position)
        .bind(profile.hire_date)
        .bind(profile.salary)
        .bind(&profile.emergency_contact)
        .bind(&user.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<UserRecord>> {
        let total = self.count_users(filter).await?;

        let mut qb = QueryBuilder::new(SELECT_USER);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY u.created_at DESC, u.employee_id LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows: Vec<UserRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let data = rows
            .into_iter()
            .map(UserRecord::try_from)
            .collect::<RepoResult<Vec<_>>>()?;
        Ok(PaginatedResponse::new(data, total, page.page(), page.limit()))
    }

    async fn count_users(&self, filter: &UserFilter) -> RepoResult<u64> {
        let mut qb =
            QueryBuilder::new("SELECT COUNT(*) FROM users u JOIN profiles p ON p.user_id = u.id");
        push_filter(&mut qb, filter);
        let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn find_role(&self, id: &str) -> RepoResult<Option<Role>> {
        Ok(sqlx::query_as(&format!("{SELECT_ROLE} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_role_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        Ok(sqlx::query_as(&format!("{SELECT_ROLE} WHERE name = $1"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        Ok(sqlx::query_as(&format!("{SELECT_ROLE} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn ensure_role(&self, role: &Role) -> RepoResult<Role> {
        sqlx::query(
            "INSERT INTO roles (id, name, description, permissions, created_at) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(Json(&role.permissions))
        .bind(role.created_at)
        .execute(&self.pool)
        .await?;

        self.find_role_by_name(&role.name)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("role {}", role.name)))
    }
}
