//! Backend selection and sample data

use sqlx::sqlite::SqlitePool;
use tracing::info;

/// Database family, picked from the connection URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
    MySql,
}

impl Backend {
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "sqlite" => Some(Backend::Sqlite),
            "postgres" | "postgresql" => Some(Backend::Postgres),
            "mysql" => Some(Backend::MySql),
            _ => None,
        }
    }
}

/// Create and fill the sample "company" tables
///
/// Idempotent: tables are created if absent and rows are only inserted into
/// an empty `employee` table.
pub async fn seed_sample_data(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in [
        r#"
        CREATE TABLE IF NOT EXISTS branch (
            branch_id INTEGER PRIMARY KEY,
            branch_name VARCHAR(40),
            mgr_id INTEGER,
            mgr_start_date DATE
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS employee (
            emp_id INTEGER PRIMARY KEY,
            first_name VARCHAR(40),
            last_name VARCHAR(40),
            birth_day DATE,
            sex VARCHAR(1),
            salary INTEGER,
            super_id INTEGER REFERENCES employee(emp_id),
            branch_id INTEGER REFERENCES branch(branch_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS client (
            client_id INTEGER PRIMARY KEY,
            client_name VARCHAR(40),
            branch_id INTEGER REFERENCES branch(branch_id)
        )
        "#,
        // Composite key: rows can be read but not addressed by a single id
        r#"
        CREATE TABLE IF NOT EXISTS works_with (
            emp_id INTEGER REFERENCES employee(emp_id),
            client_id INTEGER REFERENCES client(client_id),
            total_sales INTEGER,
            PRIMARY KEY (emp_id, client_id)
        )
        "#,
        // No key at all
        r#"
        CREATE TABLE IF NOT EXISTS trigger_test (
            message VARCHAR(100)
        )
        "#,
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    let employee_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employee")
        .fetch_one(pool)
        .await?;

    if employee_count.0 > 0 {
        return Ok(());
    }

    let branches: [(i64, &str, Option<i64>, Option<&str>); 4] = [
        (1, "Corporate", Some(100), Some("2006-02-09")),
        (2, "Scranton", Some(102), Some("1992-04-06")),
        (3, "Stamford", Some(106), Some("1998-02-13")),
        (4, "Buffalo", None, None),
    ];
    for (branch_id, branch_name, mgr_id, mgr_start_date) in branches {
        sqlx::query("INSERT INTO branch (branch_id, branch_name, mgr_id, mgr_start_date) VALUES (?, ?, ?, ?)")
            .bind(branch_id)
            .bind(branch_name)
            .bind(mgr_id)
            .bind(mgr_start_date)
            .execute(pool)
            .await?;
    }

    let employees: [(i64, &str, &str, &str, &str, i64, Option<i64>, i64); 9] = [
        (100, "David", "Wallace", "1967-11-17", "M", 250000, None, 1),
        (101, "Jan", "Levinson", "1961-05-11", "F", 110000, Some(100), 1),
        (102, "Michael", "Scott", "1964-03-15", "M", 75000, Some(100), 2),
        (103, "Angela", "Martin", "1971-06-25", "F", 63000, Some(102), 2),
        (104, "Kelly", "Kapoor", "1980-02-05", "F", 55000, Some(102), 2),
        (105, "Stanley", "Hudson", "1958-02-19", "M", 69000, Some(102), 2),
        (106, "Josh", "Porter", "1969-09-05", "M", 78000, Some(100), 3),
        (107, "Andy", "Bernard", "1973-07-22", "M", 65000, Some(106), 3),
        (108, "Jim", "Halpert", "1978-10-01", "M", 71000, Some(106), 3),
    ];
    for (emp_id, first_name, last_name, birth_day, sex, salary, super_id, branch_id) in employees {
        sqlx::query(
            "INSERT INTO employee (emp_id, first_name, last_name, birth_day, sex, salary, super_id, branch_id) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(emp_id)
        .bind(first_name)
        .bind(last_name)
        .bind(birth_day)
        .bind(sex)
        .bind(salary)
        .bind(super_id)
        .bind(branch_id)
        .execute(pool)
        .await?;
    }

    let clients: [(i64, &str, i64); 4] = [
        (400, "Dunmore Highschool", 2),
        (401, "Lackawana Country", 2),
        (402, "FedEx", 3),
        (403, "John Daly Law, LLC", 3),
    ];
    for (client_id, client_name, branch_id) in clients {
        sqlx::query("INSERT INTO client (client_id, client_name, branch_id) VALUES (?, ?, ?)")
            .bind(client_id)
            .bind(client_name)
            .bind(branch_id)
            .execute(pool)
            .await?;
    }

    let works_with: [(i64, i64, i64); 4] = [
        (105, 400, 55000),
        (102, 401, 267000),
        (108, 402, 22500),
        (107, 403, 5000),
    ];
    for (emp_id, client_id, total_sales) in works_with {
        sqlx::query("INSERT INTO works_with (emp_id, client_id, total_sales) VALUES (?, ?, ?)")
            .bind(emp_id)
            .bind(client_id)
            .bind(total_sales)
            .execute(pool)
            .await?;
    }

    info!(
        branches = branches.len(),
        employees = employees.len(),
        clients = clients.len(),
        "Sample data seeded"
    );
    Ok(())
}
