use crate::events::EventRepository;
use crate::notifications::NotificationRepository;
use crate::projects::ProjectRepository;
use crate::ratings::RatingRepository;
use crate::tasks::TaskRepository;
use crate::users::UserRepository;
use crate::MarketplaceError;

pub trait Store {
    type Projects<'a>: ProjectRepository
    where
        Self: 'a;
    type Tasks<'a>: TaskRepository
    where
        Self: 'a;
    type Ratings<'a>: RatingRepository
    where
        Self: 'a;
    type Notifications<'a>: NotificationRepository
    where
        Self: 'a;
    type Users<'a>: UserRepository
    where
        Self: 'a;
    type Events<'a>: EventRepository
    where
        Self: 'a;

    fn projects(&self) -> Self::Projects<'_>;
    fn tasks(&self) -> Self::Tasks<'_>;
    fn ratings(&self) -> Self::Ratings<'_>;
    fn notifications(&self) -> Self::Notifications<'_>;
    fn users(&self) -> Self::Users<'_>;
    fn events(&self) -> Self::Events<'_>;

    /// Runs `f` inside one exclusive transaction. The review sequence
    /// {task write, recompute, conditionally notify} relies on this for its
    /// exactly-once completion edge.
    fn with_tx<F, T>(&self, f: F) -> Result<T, MarketplaceError>
    where
        F: FnOnce(&Self) -> Result<T, MarketplaceError>;
}
