use crate::ImageId;

/// Navigation intents issued by the study list. The host owns the routing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Detail { id: ImageId },
    Create,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Detail { id } => format!("/study/{id}"),
            Route::Create => "/study/create".to_string(),
        }
    }
}

pub trait Navigator {
    fn push(&mut self, route: Route);
}
