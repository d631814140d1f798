//! Team scoping
//!
//! A template belongs to its workstation's team when it has a workstation,
//! otherwise to its assigned employee's team.

use dt_core::result::DtResult;
use dt_core::traits::Id;
use dt_db::TeamDirectory;
use dt_models::TaskTemplate;
use tracing::warn;

pub async fn scope_team(directory: &dyn TeamDirectory, template: &TaskTemplate) -> DtResult<Option<Id>> {
    if let Some(workstation_id) = template.workstation_id {
        let workstation = directory.workstation(workstation_id).await?;
        return Ok(workstation.and_then(|w| w.team_id));
    }
    if let Some(employee_id) = template.assigned_to_employee_id {
        let employee = directory.employee(employee_id).await?;
        return Ok(employee.and_then(|e| e.team_id));
    }
    Ok(None)
}

/// Templates kept by a team filter
#[derive(Debug, Default)]
pub struct ScopedTemplates {
    pub in_scope: Vec<TaskTemplate>,
    /// Templates left out because their team could not be looked up
    pub unresolved: usize,
}

/// Keep the templates whose team is one of `team_ids`
///
/// A failed lookup drops that template alone, so one broken workstation or
/// employee row cannot fail a caller who may not even own it.
pub async fn templates_in_scope(
    directory: &dyn TeamDirectory,
    templates: Vec<TaskTemplate>,
    team_ids: &[Id],
) -> ScopedTemplates {
    let mut scoped = ScopedTemplates::default();
    for template in templates {
        match scope_team(directory, &template).await {
            Ok(Some(team)) if team_ids.contains(&team) => scoped.in_scope.push(template),
            Ok(_) => {}
            Err(err) => {
                warn!(template_id = template.id, error = %err, "team lookup failed; template left out of scope");
                scoped.unresolved += 1;
            }
        }
    }
    scoped
}

/// Whether `actor_id` manages `team_id`
pub async fn manages(directory: &dyn TeamDirectory, actor_id: Id, team_id: Option<Id>) -> DtResult<bool> {
    let Some(team_id) = team_id else {
        return Ok(false);
    };
    Ok(directory.teams_managed_by(actor_id).await?.contains(&team_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_db::MemoryDirectory;
    use dt_models::{Employee, NewTaskTemplate, Workstation};

    #[tokio::test]
    async fn test_workstation_team_wins() {
        let directory = MemoryDirectory::new();
        directory.add_workstation(Workstation::new(1, "Grill", 10)).await;
        directory.add_employee(Employee::new(2, "Kim", 20)).await;

        let both = TaskTemplate::from_new(
            1,
            NewTaskTemplate::new("Scrape grill", 1).at_workstation(1).assigned_to(2),
            chrono::Utc::now(),
        );
        assert_eq!(scope_team(&directory, &both).await.unwrap(), Some(10));

        let direct = TaskTemplate::from_new(
            2,
            NewTaskTemplate::new("Call supplier", 1).assigned_to(2),
            chrono::Utc::now(),
        );
        assert_eq!(scope_team(&directory, &direct).await.unwrap(), Some(20));
    }

    #[tokio::test]
    async fn test_templates_in_scope_filters_by_team() {
        let directory = MemoryDirectory::new();
        directory.add_workstation(Workstation::new(1, "Grill", 10)).await;
        directory.add_workstation(Workstation::new(2, "Bar", 20)).await;

        let now = chrono::Utc::now();
        let templates = vec![
            TaskTemplate::from_new(1, NewTaskTemplate::new("Scrape grill", 1).at_workstation(1), now),
            TaskTemplate::from_new(2, NewTaskTemplate::new("Polish taps", 1).at_workstation(2), now),
            // Workstation without a directory row has no team
            TaskTemplate::from_new(3, NewTaskTemplate::new("Sweep yard", 1).at_workstation(9), now),
        ];

        let scoped = templates_in_scope(&directory, templates, &[10]).await;
        let ids: Vec<Id> = scoped.in_scope.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(scoped.unresolved, 0);
    }

    #[tokio::test]
    async fn test_manages() {
        let directory = MemoryDirectory::new();
        directory.add_manager(100, 10).await;

        assert!(manages(&directory, 100, Some(10)).await.unwrap());
        assert!(!manages(&directory, 100, Some(20)).await.unwrap());
        assert!(!manages(&directory, 100, None).await.unwrap());
    }
}
