//! Pet model catalog and current-model selection.

use crate::model::pet_model::{NewPetModel, PetModel, PetModelId};
use crate::model::user::UserId;
use crate::repo::pet_model_repo::PetModelRepository;
use crate::service::catalog_service::CatalogError;
use log::info;

pub struct PetModelService<R: PetModelRepository> {
    repo: R,
}

impl<R: PetModelRepository> PetModelService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn add_pet_model(&self, model: &NewPetModel) -> Result<PetModel, CatalogError> {
        Ok(self.repo.create_pet_model(model)?)
    }

    pub fn get_pet_model(&self, id: PetModelId) -> Result<PetModel, CatalogError> {
        self.repo
            .get_pet_model(id)?
            .ok_or(CatalogError::PetModelNotFound(id))
    }

    /// Lists models grouped by kind, defaults first.
    pub fn list_pet_models(&self) -> Result<Vec<PetModel>, CatalogError> {
        Ok(self.repo.list_pet_models()?)
    }

    /// Switches the user's current pet model and returns it.
    pub fn select_model(
        &self,
        user_id: UserId,
        model_id: PetModelId,
    ) -> Result<PetModel, CatalogError> {
        self.repo.set_user_model(user_id, model_id)?;
        info!(
            "event=pet_model_select module=catalog status=ok user_id={} model_id={}",
            user_id, model_id
        );
        self.get_pet_model(model_id)
    }
}
