//! Floating detail panel for the selected node or edge.

use leptos::prelude::*;

use crate::components::force_graph::tooltip::Tooltip;

/// Renders `tooltip` at its screen anchor, relative to the graph container.
///
/// Links only carry the filtered query URL; following them is left to the
/// browser.
#[component]
pub fn TooltipOverlay(
	#[prop(into)] tooltip: Signal<Option<Tooltip>>,
	#[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
	move || {
		tooltip.get().map(|tip| {
			let style = format!(
				"position: absolute; left: {}px; top: {}px;",
				tip.anchor.x, tip.anchor.y
			);
			let rows = tip
				.entries
				.into_iter()
				.map(|entry| {
					let value = match entry.link {
						Some(href) => view! { <a href=href>{entry.value}</a> }.into_any(),
						None => view! { <span>{entry.value}</span> }.into_any(),
					};
					view! {
						<dt>{entry.label}</dt>
						<dd>{value}</dd>
					}
				})
				.collect_view();

			view! {
				<div class="graph-tooltip" style=style>
					<button class="graph-tooltip-close" on:click=move |_| on_close.run(())>
						"×"
					</button>
					<dl>{rows}</dl>
				</div>
			}
		})
	}
}
