use domain::OrderStatus;

/// Builder for constructing order queries.
///
/// Results are always ordered newest first. Filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Filter by customer email, compared case-insensitively.
    pub customer_email: Option<String>,

    /// Filter by status (any of these).
    pub statuses: Option<Vec<OrderStatus>>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,
}

impl OrderQuery {
    /// Creates a new empty query matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the query behind a customer's order history: their orders in
    /// any customer-visible status.
    pub fn visible_to(email: impl Into<String>) -> Self {
        Self::new()
            .customer_email(email)
            .statuses(OrderStatus::customer_visible())
    }

    /// Filters by customer email.
    pub fn customer_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    /// Filters by a single status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.statuses = Some(vec![status]);
        self
    }

    /// Filters by multiple statuses (any of these).
    pub fn statuses(mut self, statuses: Vec<OrderStatus>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    /// Limits the number of orders returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many orders before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the order passes the email and status filters.
    ///
    /// Pagination is not considered.
    pub fn matches(&self, order: &domain::Order) -> bool {
        if let Some(email) = &self.customer_email
            && !order.customer.has_email(email)
        {
            return false;
        }
        if let Some(statuses) = &self.statuses
            && !statuses.contains(&order.status)
        {
            return false;
        }
        true
    }

    /// Stored spellings for the status filter, including legacy ones.
    pub(crate) fn status_names(&self) -> Option<Vec<String>> {
        self.statuses.as_ref().map(|statuses| {
            let mut names = Vec::with_capacity(statuses.len());
            for status in statuses {
                names.push(status.as_str().to_string());
                match status {
                    OrderStatus::Processing => names.push("succeeded".to_string()),
                    OrderStatus::Cancelled => names.push("canceled".to_string()),
                    _ => {}
                }
            }
            names
        })
    }
}
