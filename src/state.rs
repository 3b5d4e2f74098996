use jiff::Zoned;
use jiff::civil::Date;
use tracing::{debug, info};

use crate::catalog::{Catalog, Decision, Registration, Reviewer};
use crate::filter::{filter_products, visible_to};
use crate::model::{CategoryFilter, Product, ProductId, Role, Viewer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Map,
    List,
    /// Farmer's own registrations and the registration form
    MyFarms,
    /// Admin review queue, statistics and audit log
    Dashboard,
}

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Map => "Bản đồ",
            Tab::List => "Danh sách",
            Tab::MyFarms => "Vùng trồng của tôi",
            Tab::Dashboard => "Quản lý",
        }
    }

    /// Tabs offered to a viewer
    pub fn for_viewer(viewer: &Viewer) -> Vec<Tab> {
        match viewer.role {
            Role::Farmer { .. } => vec![Tab::Map, Tab::List, Tab::MyFarms],
            Role::Buyer => vec![Tab::Map, Tab::List],
            Role::Admin { .. } => vec![Tab::Map, Tab::List, Tab::Dashboard],
        }
    }
}

#[derive(Debug, Clone)]
pub enum InputIntent {
    ApplySearch(String),
    SetCategory(CategoryFilter),
    SwitchTab(Tab),
    SelectForReview(ProductId),
    /// Asks for confirmation first
    Review(Decision),
    ConfirmReview,
    Resubmit(ProductId),
    Register(Registration),
    ExpireCertificates,
    ChangeViewer(Viewer),
    Cancel,
}

// --- AppState ---

pub struct AppState {
    pub catalog: Catalog,
    pub viewer: Viewer,
    pub applied_query: String,
    pub category: CategoryFilter,
    /// Products visible to the viewer under the query and category, catalog order
    pub filtered: Vec<Product>,
    pub current_tab: Tab,
    /// Admin's review queue cursor; independent of the map selection
    pub review_selection: Option<ProductId>,
    pub pending_decision: Option<Decision>,
    pub status_message: Option<(String, bool)>,
    /// Set whenever `filtered` was recomputed during the last intent
    pub list_changed: bool,
    pub today: Date,
}

impl AppState {
    pub fn new(catalog: Catalog, viewer: Viewer) -> Self {
        Self::with_today(catalog, viewer, Zoned::now().date())
    }

    pub fn with_today(catalog: Catalog, viewer: Viewer, today: Date) -> Self {
        let mut state = Self {
            catalog,
            viewer,
            applied_query: String::new(),
            category: CategoryFilter::All,
            filtered: Vec::new(),
            current_tab: Tab::Map,
            review_selection: None,
            pending_decision: None,
            status_message: None,
            list_changed: false,
            today,
        };
        state.recompute();
        state
    }

    pub fn recompute(&mut self) {
        self.filtered = filter_products(
            self.catalog.products(),
            &self.viewer,
            &self.applied_query,
            &self.category,
        );
        self.list_changed = true;
        debug!(
            "Filtered {} of {} products (query {:?}, category {})",
            self.filtered.len(),
            self.catalog.products().len(),
            self.applied_query,
            self.category.label()
        );
    }

    pub fn set_status(&mut self, msg: String, is_error: bool) {
        self.status_message = Some((msg, is_error));
    }

    /// Pending and re-pending products inside the admin's area
    pub fn review_queue(&self) -> Vec<&Product> {
        self.catalog.pending().filter(|p| visible_to(p, &self.viewer)).collect()
    }

    pub fn review_target(&self) -> Option<&Product> {
        let id = self.review_selection.as_deref()?;
        self.catalog.get(id)
    }

    pub fn my_products(&self) -> Vec<&Product> {
        match &self.viewer.role {
            Role::Farmer { farmer_id } => self.catalog.owned_by(farmer_id).collect(),
            _ => Vec::new(),
        }
    }

    pub fn handle_input(&mut self, intent: InputIntent) {
        self.list_changed = false;

        // Review confirmation modal
        if self.pending_decision.is_some() {
            match intent {
                InputIntent::ConfirmReview => self.perform_review(),
                InputIntent::Cancel => self.pending_decision = None,
                _ => {}
            }
            return;
        }

        match intent {
            InputIntent::ApplySearch(query) => {
                if query != self.applied_query {
                    self.applied_query = query;
                    self.recompute();
                }
            }
            InputIntent::SetCategory(category) => {
                if category != self.category {
                    self.category = category;
                    self.recompute();
                }
            }
            InputIntent::SwitchTab(tab) => {
                if Tab::for_viewer(&self.viewer).contains(&tab) {
                    self.current_tab = tab;
                }
            }
            InputIntent::SelectForReview(id) => {
                if self.review_queue().iter().any(|p| p.id == id) {
                    self.review_selection = Some(id);
                } else {
                    self.set_status(format!("{} is not awaiting review.", id), true);
                }
            }
            InputIntent::Review(decision) => {
                if Reviewer::from_viewer(&self.viewer).is_none() {
                    self.set_status("Only administrators can review registrations.".to_string(), true);
                } else if self.review_selection.is_none() {
                    self.set_status("No registration selected.".to_string(), false);
                } else {
                    self.pending_decision = Some(decision);
                }
            }
            InputIntent::ConfirmReview => {}
            InputIntent::Resubmit(id) => self.perform_resubmit(&id),
            InputIntent::Register(registration) => self.perform_register(registration),
            InputIntent::ExpireCertificates => {
                let count = self.catalog.expire_certificates(self.today);
                if count > 0 {
                    self.recompute();
                }
                self.set_status(format!("{} registrations expired.", count), false);
            }
            InputIntent::ChangeViewer(viewer) => {
                info!("Viewer changed to {} ({:?})", viewer.name, viewer.role);
                self.viewer = viewer;
                self.review_selection = None;
                if !Tab::for_viewer(&self.viewer).contains(&self.current_tab) {
                    self.current_tab = Tab::Map;
                }
                self.recompute();
            }
            InputIntent::Cancel => self.status_message = None,
        }
    }

    fn perform_review(&mut self) {
        let (Some(decision), Some(id)) = (self.pending_decision.take(), self.review_selection.clone())
        else {
            return;
        };
        let Some(reviewer) = Reviewer::from_viewer(&self.viewer) else {
            return;
        };
        let approved = matches!(decision, Decision::Approve { .. });
        match self.catalog.review(&id, decision, &reviewer) {
            Ok(()) => {
                self.review_selection = None;
                self.recompute();
                let verb = if approved { "Approved" } else { "Rejected" };
                self.set_status(format!("{} {}.", verb, id), false);
            }
            Err(e) => self.set_status(format!("Review failed: {:#}", e), true),
        }
    }

    fn perform_resubmit(&mut self, id: &str) {
        let owns = self.my_products().iter().any(|p| p.id == id);
        if !owns {
            self.set_status(format!("{} is not one of your registrations.", id), true);
            return;
        }
        match self.catalog.resubmit(id) {
            Ok(()) => {
                self.recompute();
                self.set_status(format!("{} sent back for review.", id), false);
            }
            Err(e) => self.set_status(format!("Resubmit failed: {:#}", e), true),
        }
    }

    fn perform_register(&mut self, mut registration: Registration) {
        let Role::Farmer { farmer_id } = &self.viewer.role else {
            self.set_status("Only farmers can register production regions.".to_string(), true);
            return;
        };
        registration.farmer_id = farmer_id.clone();
        if registration.farmer_name.trim().is_empty() {
            registration.farmer_name = self.viewer.name.clone();
        }
        match self.catalog.register(registration, self.today) {
            Ok(id) => {
                self.recompute();
                self.set_status(format!("Registration {} submitted for review.", id), false);
            }
            Err(e) => self.set_status(format!("Registration rejected: {:#}", e), true),
        }
    }
}
