use pipeline_core::PipelineResult;
use pipeline_domain::validation;
use pipeline_domain::{Label, LabelColor, LabelContext, LabelFilter, NewLabel};
use pipeline_remote::PipelineApi;

use crate::PipelineBoard;

impl<A: PipelineApi> PipelineBoard<A> {
    /// Labels usable on opportunities, as of the last load.
    pub fn labels(&self) -> Vec<Label> {
        self.labels.lock().clone()
    }

    /// Fetch the sales labels (sales-scoped plus unscoped) into the cache.
    pub async fn load_labels(&self) -> PipelineResult<Vec<Label>> {
        let filter = LabelFilter::for_context(LabelContext::Sales);
        let labels = self.remote(self.api.fetch_labels(filter)).await?;
        tracing::debug!("Loaded {} labels", labels.len());
        *self.labels.lock() = labels.clone();
        Ok(labels)
    }

    pub async fn create_label(
        &self,
        name: &str,
        color: LabelColor,
        context: Option<LabelContext>,
    ) -> PipelineResult<Label> {
        let name = validation::required("name", name)?;
        let label = self
            .remote(self.api.create_label(NewLabel {
                name,
                color,
                context,
            }))
            .await?;

        tracing::info!("Created label: {} ({})", label.name, label.color);
        if label.applies_to(LabelContext::Sales) {
            self.labels.lock().push(label.clone());
        }
        Ok(label)
    }

    /// Find a cached label by name, ignoring case.
    pub fn resolve_label(&self, name: &str) -> Option<Label> {
        let name = name.trim();
        self.labels
            .lock()
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoardSettings;
    use pipeline_core::PipelineError;
    use pipeline_remote::InMemoryApi;

    fn seeded() -> PipelineBoard<InMemoryApi> {
        let api = InMemoryApi::new();
        for (name, context) in [
            ("VIP", Some(LabelContext::Sales)),
            ("Encaixe", Some(LabelContext::Appointment)),
            ("Geral", None),
        ] {
            api.seed_label(Label {
                id: uuid::Uuid::new_v4(),
                name: name.to_string(),
                color: LabelColor::Purple,
                context,
            });
        }
        PipelineBoard::new(api, BoardSettings::default())
    }

    #[tokio::test]
    async fn test_load_labels_keeps_sales_and_shared() {
        let board = seeded();
        let labels = board.load_labels().await.unwrap();
        let names: Vec<_> = labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["VIP", "Geral"]);
        assert_eq!(board.labels(), labels);
    }

    #[tokio::test]
    async fn test_resolve_label_ignores_case() {
        let board = seeded();
        board.load_labels().await.unwrap();
        assert_eq!(board.resolve_label(" vip ").map(|l| l.name), Some("VIP".to_string()));
        assert!(board.resolve_label("Encaixe").is_none());
    }

    #[tokio::test]
    async fn test_create_label_updates_cache() {
        let board = seeded();
        let label = board
            .create_label("Retorno", LabelColor::Cyan, Some(LabelContext::Sales))
            .await
            .unwrap();
        assert_eq!(board.resolve_label("retorno"), Some(label));

        board
            .create_label("Consulta", LabelColor::Red, Some(LabelContext::Appointment))
            .await
            .unwrap();
        assert!(board.resolve_label("Consulta").is_none());
    }

    #[tokio::test]
    async fn test_create_label_requires_name() {
        let board = seeded();
        let result = board.create_label(" ", LabelColor::Blue, None).await;
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }
}
