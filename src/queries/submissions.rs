use sea_query::{
    BinOper, Condition, DeleteStatement, Expr, Func, InsertStatement, Order, Query,
    SelectStatement, SimpleExpr,
};

use crate::models::NewSubmission;
use crate::schema::{Submissions, SEARCHABLE_COLUMNS};

const ALL_COLUMNS: [Submissions; 11] = [
    Submissions::Id,
    Submissions::MaterialType,
    Submissions::Title,
    Submissions::Description,
    Submissions::Quantity,
    Submissions::Name,
    Submissions::Location,
    Submissions::Contact,
    Submissions::Email,
    Submissions::Photos,
    Submissions::SubmissionDate,
];

/// Admin listing filter; both terms are matched as case-insensitive substrings
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    /// Matched against every searchable column, OR-ed
    pub search: Option<String>,
    /// Matched against material_type only, AND-ed with `search`
    pub material: Option<String>,
}

impl SubmissionFilter {
    /// Build a filter from raw query values; blank terms are ignored
    pub fn new(search: Option<&str>, material: Option<&str>) -> Self {
        let clean = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            search: clean(search),
            material: clean(material),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.material.is_none()
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(term) = &self.search {
            let any_column = SEARCHABLE_COLUMNS
                .iter()
                .fold(Condition::any(), |any, column| {
                    any.add(contains_ignore_case(*column, term))
                });
            condition = condition.add(any_column);
        }
        if let Some(material) = &self.material {
            condition = condition.add(contains_ignore_case(Submissions::MaterialType, material));
        }
        condition
    }

    fn apply(&self, query: &mut SelectStatement) {
        if !self.is_empty() {
            query.cond_where(self.condition());
        }
    }
}

const LIKE_ESCAPE: char = '!';

/// Escape LIKE wildcards so the term is matched literally
///
/// Case is left alone: both sides are folded by the database's LOWER(), so a
/// stored value always matches its own text even where LOWER() only folds ASCII.
pub fn like_substring_pattern(term: &str) -> String {
    let mut pattern = String::from("%");
    for c in term.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// LOWER(column) LIKE LOWER('%term%') ESCAPE '!'
fn contains_ignore_case(column: Submissions, term: &str) -> SimpleExpr {
    let pattern = SimpleExpr::Binary(
        Box::new(Func::lower(Expr::val(like_substring_pattern(term))).into()),
        BinOper::Escape,
        Box::new(SimpleExpr::Constant(LIKE_ESCAPE.into())),
    );
    Expr::expr(Func::lower(Expr::col(column))).binary(BinOper::Like, pattern)
}

/// INSERT INTO submissions (...) VALUES (...) RETURNING id
pub fn insert(submission: &NewSubmission) -> InsertStatement {
    Query::insert()
        .into_table(Submissions::Table)
        .columns([
            Submissions::MaterialType,
            Submissions::Title,
            Submissions::Description,
            Submissions::Quantity,
            Submissions::Name,
            Submissions::Location,
            Submissions::Contact,
            Submissions::Email,
            Submissions::Photos,
            Submissions::SubmissionDate,
        ])
        .values_panic([
            submission.material_type.clone().into(),
            submission.title.clone().into(),
            submission.description.clone().into(),
            submission.quantity.clone().into(),
            submission.name.clone().into(),
            submission.location.clone().into(),
            submission.contact.clone().into(),
            submission.email.clone().into(),
            submission.photos.clone().into(),
            submission.submission_date.clone().into(),
        ])
        .returning_col(Submissions::Id)
        .to_owned()
}

/// SELECT * FROM submissions WHERE id = ?
pub fn select_by_id(id: i64) -> SelectStatement {
    Query::select()
        .columns(ALL_COLUMNS)
        .from(Submissions::Table)
        .and_where(Expr::col(Submissions::Id).eq(id))
        .to_owned()
}

/// DELETE FROM submissions WHERE id = ?
pub fn delete_by_id(id: i64) -> DeleteStatement {
    Query::delete()
        .from_table(Submissions::Table)
        .and_where(Expr::col(Submissions::Id).eq(id))
        .to_owned()
}

/// SELECT * FROM submissions WHERE <filter> ORDER BY id DESC LIMIT ? OFFSET ?
pub fn select_page(filter: &SubmissionFilter, limit: u64, offset: u64) -> SelectStatement {
    let mut query = Query::select()
        .columns(ALL_COLUMNS)
        .from(Submissions::Table)
        .to_owned();
    filter.apply(&mut query);
    query
        .order_by(Submissions::Id, Order::Desc)
        .limit(limit)
        .offset(offset)
        .to_owned()
}

/// SELECT COUNT(id) FROM submissions WHERE <filter>
pub fn count_matching(filter: &SubmissionFilter) -> SelectStatement {
    let mut query = Query::select()
        .expr(Func::count(Expr::col(Submissions::Id)))
        .from(Submissions::Table)
        .to_owned();
    filter.apply(&mut query);
    query
}

/// SELECT COUNT(DISTINCT material_type) FROM submissions
pub fn count_material_types() -> SelectStatement {
    Query::select()
        .expr(Func::count_distinct(Expr::col(Submissions::MaterialType)))
        .from(Submissions::Table)
        .to_owned()
}

/// SELECT photos FROM submissions WHERE photos != ''
pub fn select_nonempty_photos() -> SelectStatement {
    Query::select()
        .column(Submissions::Photos)
        .from(Submissions::Table)
        .and_where(Expr::col(Submissions::Photos).ne(""))
        .to_owned()
}

/// SELECT COUNT(id) FROM submissions WHERE submission_date LIKE 'YYYY-MM-DD%'
pub fn count_submitted_on(date: &str) -> SelectStatement {
    Query::select()
        .expr(Func::count(Expr::col(Submissions::Id)))
        .from(Submissions::Table)
        .and_where(Expr::col(Submissions::SubmissionDate).like(format!("{}%", date)))
        .to_owned()
}

/// SELECT * FROM submissions ORDER BY id DESC LIMIT ?
pub fn select_recent(limit: u64) -> SelectStatement {
    Query::select()
        .columns(ALL_COLUMNS)
        .from(Submissions::Table)
        .order_by(Submissions::Id, Order::Desc)
        .limit(limit)
        .to_owned()
}
