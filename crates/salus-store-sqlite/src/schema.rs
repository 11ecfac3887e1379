//! SQL schema for the Salus SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS employees (
    employee_id TEXT PRIMARY KEY,
    full_name   TEXT NOT NULL,
    cpf         TEXT,
    born_on     TEXT,            -- ISO 8601 date
    created_at  TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS clients (
    client_id    TEXT PRIMARY KEY,
    company_name TEXT NOT NULL,
    cnpj         TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS exam_types (
    exam_type_id             TEXT PRIMARY KEY,
    description              TEXT NOT NULL,
    list_value               TEXT NOT NULL,      -- decimal, two places
    initial_validity_months  INTEGER NOT NULL,
    periodic_validity_months INTEGER NOT NULL,
    created_at               TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS visits (
    visit_id       TEXT PRIMARY KEY,
    tenant_id      TEXT NOT NULL,
    employee_id    TEXT NOT NULL REFERENCES employees(employee_id),
    client_id      TEXT NOT NULL REFERENCES clients(client_id),
    attendant_id   TEXT,
    visit_date     TEXT NOT NULL,   -- ISO 8601 date, resolved at write time
    payment_method TEXT NOT NULL,   -- 'cash' | 'card' | 'invoice' | 'courtesy'
    kind           TEXT NOT NULL,   -- 'admission' | 'periodic' | ...
    role           TEXT NOT NULL,
    status         TEXT NOT NULL DEFAULT 'active',
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- Items exist only under their visit and only while it is active;
-- cancelling the visit hard-deletes them.
CREATE TABLE IF NOT EXISTS visit_items (
    item_id         TEXT PRIMARY KEY,
    visit_id        TEXT NOT NULL REFERENCES visits(visit_id),
    exam_type_id    TEXT NOT NULL REFERENCES exam_types(exam_type_id),
    practitioner_id TEXT NOT NULL,
    charged_value   TEXT NOT NULL,  -- decimal, two places
    expires_on      TEXT NOT NULL   -- ISO 8601 date, computed
);

-- One row per engagement cycle; terminated_on NULL means active.
CREATE TABLE IF NOT EXISTS employments (
    employment_id TEXT PRIMARY KEY,
    employee_id   TEXT NOT NULL REFERENCES employees(employee_id),
    client_id     TEXT NOT NULL REFERENCES clients(client_id),
    admitted_on   TEXT NOT NULL,
    terminated_on TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    UNIQUE (employee_id, client_id, admitted_on)
);

CREATE INDEX IF NOT EXISTS visits_tenant_idx    ON visits(tenant_id);
CREATE INDEX IF NOT EXISTS visits_pair_idx      ON visits(employee_id, client_id);
CREATE INDEX IF NOT EXISTS items_visit_idx      ON visit_items(visit_id);
CREATE INDEX IF NOT EXISTS items_exam_idx       ON visit_items(exam_type_id);
CREATE INDEX IF NOT EXISTS employments_pair_idx ON employments(employee_id, client_id);

PRAGMA user_version = 1;
";
