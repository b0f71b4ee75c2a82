use leptos::prelude::*;
use log::warn;

use crate::components::results_map::ResultsMapCanvas;
use crate::map::{LayerType, RelationType, ResultsMapData, Result};

/// The default template with a few groups, bubbles and edges filled in.
fn sample_map() -> Result<ResultsMapData> {
	let mut data = ResultsMapData::default();
	let g1 = data.add_group("G1", 0.0, 2.0)?;
	let g2 = data.add_group("G2", 2.0, 4.0)?;
	let g3 = data.add_group("GROUP3 WITH A LONG NAME", 4.0, 6.0)?;

	let prevented = data.add_bubble("fires are prevented", LayerType::Strategic, &g1)?;
	let injury = data.add_bubble("less injury from fire incidents", LayerType::Mission, &g1)?;
	let crews = data.add_bubble("crews arrive at emergencies quickly", LayerType::Process, &g2)?;
	let transit = data.add_bubble("transit without bottlenecks", LayerType::Operational, &g3)?;

	data.add_relationship(&prevented, &injury, RelationType::CauseEffect)?;
	data.add_relationship(&crews, &transit, RelationType::Companion)?;
	data.add_relationship(&prevented, &transit, RelationType::Conflict)?;
	Ok(data)
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let initial = sample_map().unwrap_or_else(|err| {
		warn!("sample map rejected, starting empty: {err}");
		ResultsMapData::default()
	});
	let data = RwSignal::new(initial);

	let title = move || data.with(|d| d.map_config.title.clone());
	let summary = move || {
		data.with(|d| {
			let overflowing = d.layout().map(|l| l.overflowed().count()).unwrap_or(0);
			format!(
				"{} bubbles, {} relationships, {} overflowing",
				d.bubbles.len(),
				d.relationships.len(),
				overflowing
			)
		})
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-map">
				<ResultsMapCanvas data=data fullscreen=true />
				<div class="map-overlay">
					<h1>{title}</h1>
					<p class="subtitle">
						"Drag bubbles inside their layer and group. Scroll to zoom. Drag background to pan."
					</p>
					<p class="summary">{summary}</p>
					<button on:click=move |_| data.update(|d| d.reset())>"New map"</button>
				</div>
			</div>
		</ErrorBoundary>
	}
}
