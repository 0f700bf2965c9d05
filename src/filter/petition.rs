use serde_json::Value;

use super::sort::PetitionSort;

/// A SQL statement plus its positional parameters, ready to bind.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

/// Typed filter over the petition listing. Every field is optional; absent
/// means "no constraint" (zero is a legal value for the numeric filters).
#[derive(Debug, Clone, Default)]
pub struct PetitionFilter {
    /// Case-insensitive substring match on title or description.
    pub q: Option<String>,
    /// Category membership; empty means all categories.
    pub category_ids: Vec<i64>,
    /// Cost ceiling: include the petition if any of its tiers costs at most
    /// this much.
    pub supporting_cost: Option<i64>,
    pub owner_id: Option<i64>,
    /// Only petitions with a pledge from this user.
    pub supporter_id: Option<i64>,
    pub sort: PetitionSort,
    pub start_index: u32,
    /// Page size; `None` means the whole filtered set.
    pub count: Option<u32>,
}

const SELECT_COLUMNS: &str = "p.id, p.title, p.category_id, p.owner_id, \
     u.first_name AS owner_first_name, u.last_name AS owner_last_name, \
     (SELECT COUNT(*) FROM supporters s WHERE s.petition_id = p.id) AS number_of_supporters, \
     p.creation_date, \
     COALESCE((SELECT MIN(t.cost) FROM support_tiers t WHERE t.petition_id = p.id), 0) AS supporting_cost";

const FROM_CLAUSE: &str = "FROM petitions p JOIN users u ON p.owner_id = u.id";

impl PetitionFilter {
    /// The listing statement: filters, computed columns, deterministic order
    /// and pagination.
    pub fn to_select_sql(&self) -> SqlResult {
        let mut params: Vec<Value> = vec![];
        let where_clause = self.where_clause(&mut params);

        let mut query = format!("SELECT {} {}", SELECT_COLUMNS, FROM_CLAUSE);
        if !where_clause.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&where_clause);
        }
        query.push_str(" ORDER BY ");
        query.push_str(self.sort.order_by_sql());
        query.push_str(&self.limit_clause());

        SqlResult { query, params }
    }

    /// The companion count statement: identical WHERE clause, no ordering or
    /// pagination, so the total reflects the filtered set before slicing.
    pub fn to_count_sql(&self) -> SqlResult {
        let mut params: Vec<Value> = vec![];
        let where_clause = self.where_clause(&mut params);

        let mut query = format!("SELECT COUNT(*) AS total {}", FROM_CLAUSE);
        if !where_clause.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&where_clause);
        }

        SqlResult { query, params }
    }

    /// Conjunction of the active filters, pushing placeholders in declaration
    /// order so select and count bind identically.
    fn where_clause(&self, params: &mut Vec<Value>) -> String {
        let mut conditions: Vec<String> = vec![];

        if let Some(ref q) = self.q {
            let pattern = format!("%{}%", q);
            params.push(Value::String(pattern.clone()));
            let title_param = params.len();
            params.push(Value::String(pattern));
            conditions.push(format!(
                "(p.title ILIKE ${} OR p.description ILIKE ${})",
                title_param,
                params.len()
            ));
        }

        if !self.category_ids.is_empty() {
            let mut placeholders = Vec::with_capacity(self.category_ids.len());
            for id in &self.category_ids {
                params.push(Value::from(*id));
                placeholders.push(format!("${}", params.len()));
            }
            conditions.push(format!("p.category_id IN ({})", placeholders.join(", ")));
        }

        if let Some(ceiling) = self.supporting_cost {
            params.push(Value::from(ceiling));
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM support_tiers t \
                 WHERE t.petition_id = p.id AND t.cost <= ${})",
                params.len()
            ));
        }

        if let Some(owner_id) = self.owner_id {
            params.push(Value::from(owner_id));
            conditions.push(format!("p.owner_id = ${}", params.len()));
        }

        if let Some(supporter_id) = self.supporter_id {
            params.push(Value::from(supporter_id));
            conditions.push(format!(
                "p.id IN (SELECT s.petition_id FROM supporters s WHERE s.user_id = ${})",
                params.len()
            ));
        }

        conditions.join(" AND ")
    }

    fn limit_clause(&self) -> String {
        let count = self.capped_count();
        match (count, self.start_index) {
            (Some(limit), 0) => format!(" LIMIT {}", limit),
            (Some(limit), offset) => format!(" LIMIT {} OFFSET {}", limit, offset),
            (None, 0) => String::new(),
            (None, offset) => format!(" OFFSET {}", offset),
        }
    }

    fn capped_count(&self) -> Option<u32> {
        let count = self.count?;
        match crate::config::CONFIG.api.max_page_size {
            Some(max) if count > max => {
                tracing::warn!("Page size {} exceeds max {}, capping to max", count, max);
                Some(max)
            }
            _ => Some(count),
        }
    }
}
