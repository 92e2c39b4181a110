use chrono::Utc;
use sea_orm::{ActiveValue, prelude::*, sea_query::OnConflict};

use crate::{Currency, CurrencyPreference, EngineError, ResultEngine, preferences};

use super::Engine;

impl Engine {
    /// Returns the owner's display currency, falling back to EUR when none
    /// was saved.
    pub async fn currency(&self, owner_id: &str) -> ResultEngine<Currency> {
        let preference = preferences::Entity::find_by_id(owner_id.to_string())
            .one(self.db()?)
            .await?
            .map(CurrencyPreference::try_from)
            .transpose()?;
        Ok(preference.map(|p| p.currency).unwrap_or_default())
    }

    /// Saves the owner's display currency.
    pub async fn set_currency(
        &self,
        owner_id: &str,
        currency: Currency,
    ) -> ResultEngine<CurrencyPreference> {
        let db = self.db()?;
        let model = preferences::ActiveModel {
            owner_id: ActiveValue::Set(owner_id.to_string()),
            currency: ActiveValue::Set(currency.code().to_string()),
            updated_at: ActiveValue::Set(Utc::now()),
        };
        preferences::Entity::insert(model)
            .on_conflict(
                OnConflict::column(preferences::Column::OwnerId)
                    .update_columns([preferences::Column::Currency, preferences::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        let model = preferences::Entity::find_by_id(owner_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("preference".to_string()))?;
        CurrencyPreference::try_from(model)
    }
}
