pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS cost_centers (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    area TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    start_date TEXT,
    end_date TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    parent_category_id INTEGER REFERENCES categories(id),
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS cost_entries (
    id INTEGER PRIMARY KEY,
    cost_center_id INTEGER NOT NULL REFERENCES cost_centers(id),
    project_id INTEGER NOT NULL REFERENCES projects(id),
    category_id INTEGER NOT NULL REFERENCES categories(id),
    reference_date TEXT NOT NULL,
    amount REAL NOT NULL,
    currency TEXT NOT NULL DEFAULT 'BRL',
    description TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS budget_entries (
    id INTEGER PRIMARY KEY,
    cost_center_id INTEGER REFERENCES cost_centers(id),
    project_id INTEGER REFERENCES projects(id),
    month_date TEXT NOT NULL,
    planned_amount REAL NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_cost_entries_date ON cost_entries(reference_date);
CREATE INDEX IF NOT EXISTS idx_cost_entries_center ON cost_entries(cost_center_id);
CREATE INDEX IF NOT EXISTS idx_cost_entries_project ON cost_entries(project_id);
CREATE INDEX IF NOT EXISTS idx_cost_entries_category ON cost_entries(category_id);
CREATE INDEX IF NOT EXISTS idx_budget_entries_month ON budget_entries(month_date);
CREATE INDEX IF NOT EXISTS idx_budget_entries_center ON budget_entries(cost_center_id);
";
