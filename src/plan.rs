// ABOUTME: Declarative migration plan for the Strapi website-builder dataset
// ABOUTME: Tables, column lists, and per-column transforms as static data

/// Transform applied to a column's value before it is bound to the
/// destination insert statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Value is carried over unchanged (integers, text, identifiers).
    Passthrough,
    /// Epoch seconds or milliseconds converted to an absolute timestamp.
    Timestamp,
    /// Any non-null value coerced to true/false.
    Boolean,
    /// Serialized text parsed into a structured JSON value, with raw-text
    /// fallback when the payload is malformed.
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub transform: Transform,
}

/// One table to copy: destination columns in insert order, first column is
/// the row identifier used in log output.
#[derive(Debug, Clone, Copy)]
pub struct TablePlan {
    pub table: &'static str,
    pub columns: &'static [ColumnSpec],
}

const fn col(name: &'static str, transform: Transform) -> ColumnSpec {
    ColumnSpec { name, transform }
}

const TEMPLATE_COLUMNS: &[ColumnSpec] = &[
    col("id", Transform::Passthrough),
    col("document_id", Transform::Passthrough),
    col("nome", Transform::Passthrough),
    col("created_at", Transform::Timestamp),
    col("updated_at", Transform::Timestamp),
    col("published_at", Transform::Timestamp),
    col("created_by_id", Transform::Passthrough),
    col("updated_by_id", Transform::Passthrough),
    col("locale", Transform::Passthrough),
];

const WEBSITE_COLUMNS: &[ColumnSpec] = &[
    col("id", Transform::Passthrough),
    col("document_id", Transform::Passthrough),
    col("subdomain", Transform::Passthrough),
    col("organization_id", Transform::Passthrough),
    col("nome", Transform::Passthrough),
    col("contenuto", Transform::Json),
    col("is_published", Transform::Boolean),
    col("is_maintenance", Transform::Boolean),
    col("custom_domain", Transform::Passthrough),
    col("seo_title", Transform::Passthrough),
    col("seo_description", Transform::Passthrough),
    col("seo_keywords", Transform::Passthrough),
    col("analytics_id", Transform::Passthrough),
    col("created_at", Transform::Timestamp),
    col("updated_at", Transform::Timestamp),
    col("published_at", Transform::Timestamp),
    col("created_by_id", Transform::Passthrough),
    col("updated_by_id", Transform::Passthrough),
    col("locale", Transform::Passthrough),
];

const TEMPLATE_LINK_COLUMNS: &[ColumnSpec] = &[
    col("id", Transform::Passthrough),
    col("organization_website_id", Transform::Passthrough),
    col("website_template_id", Transform::Passthrough),
    col("organization_website_ord", Transform::Passthrough),
];

/// Tables in dependency order: templates and websites must exist before the
/// link table rows that reference them are inserted.
pub const MIGRATION_PLAN: &[TablePlan] = &[
    TablePlan {
        table: "website_templates",
        columns: TEMPLATE_COLUMNS,
    },
    TablePlan {
        table: "organization_websites",
        columns: WEBSITE_COLUMNS,
    },
    TablePlan {
        table: "organization_websites_template_lnk",
        columns: TEMPLATE_LINK_COLUMNS,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_orders_link_table_last() {
        let tables: Vec<&str> = MIGRATION_PLAN.iter().map(|p| p.table).collect();
        assert_eq!(
            tables,
            vec![
                "website_templates",
                "organization_websites",
                "organization_websites_template_lnk"
            ]
        );
    }

    #[test]
    fn every_table_leads_with_its_identifier() {
        for plan in MIGRATION_PLAN {
            assert_eq!(plan.columns[0].name, "id", "table {}", plan.table);
        }
    }

    #[test]
    fn website_content_and_flags_are_transformed() {
        let website = &MIGRATION_PLAN[1];
        let transform_of = |name: &str| {
            website
                .columns
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.transform)
        };
        assert_eq!(transform_of("contenuto"), Some(Transform::Json));
        assert_eq!(transform_of("is_published"), Some(Transform::Boolean));
        assert_eq!(transform_of("created_at"), Some(Transform::Timestamp));
        assert_eq!(transform_of("subdomain"), Some(Transform::Passthrough));
    }
}
