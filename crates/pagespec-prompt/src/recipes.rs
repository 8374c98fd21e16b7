//! Built-in interaction recipe templates.
//!
//! A recipe id attached to a leaf expands into one prompt sentence (Leaf
//! Details) and one checklist sentence (Checklist). Unknown ids still expand,
//! into placeholder lines that ask the reader to resolve them.

/// Static template for one recipe id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeTemplate {
    pub id: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
    pub checklist: &'static str,
}

pub const RECIPES: [RecipeTemplate; 10] = [
    RecipeTemplate {
        id: "search.submit.reload",
        label: "Search reloads list",
        prompt: "When the search form is submitted, reload the target list with the search conditions and reset to page 1.",
        checklist: "Search submit reloads the list with current conditions and resets pagination",
    },
    RecipeTemplate {
        id: "table.row.open-dialog",
        label: "Row action opens dialog",
        prompt: "When a row action is clicked, load the row detail and open the related dialog.",
        checklist: "Row action opens the dialog with the clicked row's detail",
    },
    RecipeTemplate {
        id: "table.row.open-drawer",
        label: "Row action opens drawer",
        prompt: "When a row action is clicked, load the row detail and open the related drawer.",
        checklist: "Row action opens the drawer with the clicked row's detail",
    },
    RecipeTemplate {
        id: "tree.select.filter",
        label: "Tree selection filters",
        prompt: "When a tree node is selected, pass its key as a query parameter and refresh the linked list from page 1.",
        checklist: "Tree selection filters the linked list by the selected key",
    },
    RecipeTemplate {
        id: "tabs.switch.lazy-load",
        label: "Tab lazy load",
        prompt: "Load a tab's data the first time it is activated; later switches must not request again.",
        checklist: "Each tab loads once on first activation only",
    },
    RecipeTemplate {
        id: "form.submit.refresh",
        label: "Submit refreshes list",
        prompt: "After the form submits successfully, close its container and refresh the related list.",
        checklist: "Successful submit closes the form container and refreshes the list",
    },
    RecipeTemplate {
        id: "dialog.confirm.refresh",
        label: "Confirm refreshes list",
        prompt: "When the dialog's confirm action succeeds, close the dialog and refresh the related data.",
        checklist: "Dialog confirm closes the dialog and refreshes the related data",
    },
    RecipeTemplate {
        id: "chart.click.drilldown",
        label: "Chart drill-down",
        prompt: "When a chart element is clicked, drill down into the clicked dimension and show its detail data.",
        checklist: "Clicking a chart element drills down into its dimension",
    },
    RecipeTemplate {
        id: "kpi.click.filter",
        label: "KPI click filters",
        prompt: "When a KPI card is clicked, apply its metric as a filter to the related list.",
        checklist: "Clicking a KPI card filters the related list",
    },
    RecipeTemplate {
        id: "table.selection.batch-action",
        label: "Batch action on selection",
        prompt: "Enable batch actions once rows are selected; after the action succeeds, clear the selection and refresh the table.",
        checklist: "Batch actions are enabled by selection and refresh the table afterwards",
    },
];

/// Look up a built-in recipe.
#[must_use]
pub fn find_recipe(id: &str) -> Option<&'static RecipeTemplate> {
    RECIPES.iter().find(|recipe| recipe.id == id)
}

#[must_use]
pub fn is_known_recipe(id: &str) -> bool {
    find_recipe(id).is_some()
}

/// A recipe id expanded into its two output sentences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRecipe {
    pub id: String,
    pub prompt_line: String,
    pub checklist_line: String,
    pub known: bool,
}

/// Expand a recipe id. Never fails.
#[must_use]
pub fn apply_recipe(id: &str) -> AppliedRecipe {
    match find_recipe(id) {
        Some(recipe) => AppliedRecipe {
            id: id.to_owned(),
            prompt_line: recipe.prompt.to_owned(),
            checklist_line: recipe.checklist.to_owned(),
            known: true,
        },
        None => AppliedRecipe {
            id: id.to_owned(),
            prompt_line: format!("Unknown recipe: {id}"),
            checklist_line: format!("Confirm and complete unknown recipe: {id}"),
            known: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn recipe_ids_are_unique() {
        let ids: BTreeSet<_> = RECIPES.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), RECIPES.len());
    }

    #[test]
    fn known_recipe_expands_to_template() {
        let applied = apply_recipe("search.submit.reload");
        assert!(applied.known);
        assert!(applied.prompt_line.contains("search"));
        assert!(!applied.checklist_line.is_empty());
    }

    #[test]
    fn unknown_recipe_degrades_to_placeholder() {
        let applied = apply_recipe("table.row.explode");
        assert!(!applied.known);
        assert_eq!(applied.prompt_line, "Unknown recipe: table.row.explode");
        assert_eq!(
            applied.checklist_line,
            "Confirm and complete unknown recipe: table.row.explode"
        );
    }
}
