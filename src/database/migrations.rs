use sqlx::PgPool;
use tracing::info;

/// Schema statements are idempotent; run() executes them in order on startup.
const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id              BIGSERIAL PRIMARY KEY,
        email           TEXT NOT NULL UNIQUE,
        first_name      TEXT NOT NULL,
        last_name       TEXT NOT NULL,
        password        TEXT NOT NULL,
        auth_token      TEXT,
        image_filename  TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_users_auth_token ON users(auth_token)",
    "CREATE TABLE IF NOT EXISTS categories (
        id      BIGSERIAL PRIMARY KEY,
        name    TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS petitions (
        id              BIGSERIAL PRIMARY KEY,
        title           TEXT NOT NULL UNIQUE,
        description     TEXT NOT NULL,
        category_id     BIGINT NOT NULL REFERENCES categories(id),
        owner_id        BIGINT NOT NULL REFERENCES users(id),
        creation_date   TIMESTAMPTZ NOT NULL DEFAULT now(),
        image_filename  TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_petitions_owner ON petitions(owner_id)",
    "CREATE TABLE IF NOT EXISTS support_tiers (
        id              BIGSERIAL PRIMARY KEY,
        petition_id     BIGINT NOT NULL REFERENCES petitions(id) ON DELETE CASCADE,
        title           TEXT NOT NULL,
        description     TEXT NOT NULL,
        cost            BIGINT NOT NULL CHECK (cost >= 0),
        UNIQUE (petition_id, title)
    )",
    "CREATE TABLE IF NOT EXISTS supporters (
        id              BIGSERIAL PRIMARY KEY,
        petition_id     BIGINT NOT NULL REFERENCES petitions(id),
        support_tier_id BIGINT NOT NULL REFERENCES support_tiers(id),
        user_id         BIGINT NOT NULL REFERENCES users(id),
        message         TEXT,
        timestamp       TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (support_tier_id, user_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_supporters_petition ON supporters(petition_id)",
    // Seed the static category reference data
    "INSERT INTO categories (name) VALUES
        ('Animal Welfare'),
        ('Arts'),
        ('Community'),
        ('Education'),
        ('Environment'),
        ('Health'),
        ('Human Rights'),
        ('Technology')
    ON CONFLICT (name) DO NOTHING",
];

pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database migrations complete");
    Ok(())
}
