use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::filter::FilterState;
use crate::highlight::{escape_html, Highlighter};
use crate::render::{format_price, render_rows};
use crate::sync::populate_region;

#[derive(Serialize)]
struct PageState<'a> {
    region: &'a str,
    category: &'a str,
    sub_category: &'a str,
    query: &'a str,
}

/// Every `<` becomes `\u003c`, so no embedded value can open or close a
/// tag or comment inside the script element.
fn json_for_script_tag(value: &str) -> String {
    value.replace('<', "\\u003c")
}

/// Region id to sku to the formatted price cell.
fn price_labels(catalog: &Catalog) -> IndexMap<&str, IndexMap<&str, String>> {
    catalog
        .regions()
        .map(|(id, region)| {
            let labels: IndexMap<&str, String> = region
                .products
                .iter()
                .map(|p| (p.sku.as_str(), format_price(p.price, region.currency.as_deref())))
                .collect();
            (id, labels)
        })
        .collect()
}

fn options_markup(label: &str, values: &[String], selected: Option<&str>) -> String {
    let mut out = format!("<option value=\"\">{label}: ALL</option>");
    for v in values {
        let sel = if Some(v.as_str()) == selected { " selected" } else { "" };
        let v = escape_html(v);
        out.push_str(&format!("<option value=\"{v}\"{sel}>{v}</option>"));
    }
    out
}

fn region_options(catalog: &Catalog, selected: &str) -> String {
    let mut out = String::new();
    for (id, region) in catalog.regions() {
        let sel = if id == selected { " selected" } else { "" };
        let label = escape_html(region.label.as_deref().unwrap_or(id));
        out.push_str(&format!(
            "<option value=\"{}\"{sel}>{label}</option>",
            escape_html(id)
        ));
    }
    out
}

/// The standalone catalog page. The first table is rendered here; after
/// that the embedded script filters, highlights and redraws in the browser
/// with the same rules, debounced by `debounce_ms`.
pub fn render_page(catalog: &Catalog, state: &FilterState, debounce_ms: u64) -> Vec<u8> {
    let options = populate_region(catalog, &state.region);
    let mut state = state.clone();
    state.retain_offered(&options);
    let state = &state;

    let data = serde_json::to_string(catalog).unwrap_or_else(|_| "{\"regions\":{}}".to_string());
    let data = json_for_script_tag(&data);
    let prices = serde_json::to_string(&price_labels(catalog)).unwrap_or_else(|_| "{}".to_string());
    let prices = json_for_script_tag(&prices);
    let initial = serde_json::to_string(&PageState {
        region: &state.region,
        category: state.category.as_deref().unwrap_or_default(),
        sub_category: state.sub_category.as_deref().unwrap_or_default(),
        query: &state.query,
    })
    .unwrap_or_else(|_| "{}".to_string());
    let initial = json_for_script_tag(&initial);

    let products = state.apply(catalog);
    let total = catalog.products(&state.region).len();
    let (rows, _) = render_rows(
        &products,
        &Highlighter::new(&state.query),
        catalog.currency(&state.region),
    );

    let region_opts = region_options(catalog, &state.region);
    let category_opts = options_markup("CATEGORY", &options.categories, state.category.as_deref());
    let sub_category_opts = options_markup(
        "SUB-CATEGORY",
        &options.sub_categories,
        state.sub_category.as_deref(),
    );
    let query = escape_html(&state.query);
    let matched = products.len();

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Product Price List</title>
  <style>
    body {{ font-family: 'Inter', system-ui, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }}
    header {{ padding: 1rem 2rem; background: #fff; border-bottom: 1px solid #e2e8f0; position: sticky; top: 0; }}
    main {{ max-width: 1200px; margin: 0 auto; padding: 2rem; }}
    .controls {{ display: flex; flex-wrap: wrap; gap: 0.75rem; margin-bottom: 1.5rem; }}
    .controls input {{ flex: 1; min-width: 240px; }}
    .controls input, .controls select {{ padding: 0.6rem 0.9rem; border: 1px solid #cbd5e1; border-radius: 0.5rem; font-size: 0.9rem; background: #fff; }}
    table.catalog {{ width: 100%; border-collapse: collapse; background: #fff; }}
    table.catalog th, table.catalog td {{ padding: 0.5rem 1rem; text-align: left; border-bottom: 1px solid #f1f5f9; }}
    thead th {{ font-size: 0.7rem; text-transform: uppercase; letter-spacing: 0.08em; background: #f1f5f9; }}
    tr.category-row th {{ background: #135bec; color: #fff; font-size: 0.95rem; }}
    tr.sub-category-row th {{ background: #e0e7ff; font-size: 0.85rem; }}
    tr.empty-row td {{ text-align: center; color: #64748b; font-style: italic; }}
    td.price {{ text-align: right; font-variant-numeric: tabular-nums; }}
    mark {{ background: #fde68a; padding: 0; }}
    #result-count {{ font-size: 0.8rem; font-weight: 700; color: #64748b; margin-top: 1rem; }}
  </style>
</head>
<body>
  <script type="application/json" id="catalog-data">{data}</script>
  <script type="application/json" id="initial-state">{initial}</script>
  <script type="application/json" id="price-labels">{prices}</script>
  <header>
    <h1>Product Price List</h1>
  </header>
  <main>
    <div class="controls">
      <select id="region">{region_opts}</select>
      <input id="search" type="text" placeholder="Search SKU, pole height, wall thickness, category..." value="{query}"/>
      <select id="category">{category_opts}</select>
      <select id="sub-category">{sub_category_opts}</select>
    </div>

    <table class="catalog">
      <thead>
        <tr><th scope="col">SKU</th><th scope="col">Pole Height</th><th scope="col">Wall Thickness</th><th scope="col">Price</th></tr>
      </thead>
      <tbody id="catalog-body">{rows}</tbody>
    </table>
    <p id="result-count">{matched} OF {total} PRODUCTS</p>
  </main>

  <script>
    (function() {{
      const DEBOUNCE_MS = {debounce_ms};

      function escapeHtml(value) {{
        return String(value)
          .replaceAll('&', '&amp;')
          .replaceAll('<', '&lt;')
          .replaceAll('>', '&gt;')
          .replaceAll('"', '&quot;')
          .replaceAll("'", '&#39;');
      }}

      function escapeRegExp(value) {{
        return String(value).replace(/[.*+?^${{}}()|[\]\\]/g, '\\$&');
      }}

      const data = JSON.parse(document.getElementById('catalog-data').textContent || '{{"regions":{{}}}}');
      const initial = JSON.parse(document.getElementById('initial-state').textContent || '{{}}');
      const priceLabels = JSON.parse(document.getElementById('price-labels').textContent || '{{}}');
      const regions = data.regions || {{}};

      function foldCase(value) {{
        return Array.from(String(value)).map(function(c) {{
          const lower = c.toLowerCase();
          return Array.from(lower).length === 1 ? lower : c;
        }}).join('');
      }}

      for (const id of Object.keys(regions)) {{
        for (const p of (regions[id].products || [])) {{
          p._search = foldCase([p.sku, p.pole_height, p.wall_thickness, p.main_category, p.sub_category]
            .filter(function(v) {{ return v; }})
            .join(' '));
        }}
      }}

      const state = {{
        region: initial.region || Object.keys(regions)[0] || '',
        category: initial.category || '',
        subCategory: initial.sub_category || '',
        query: initial.query || ''
      }};

      const regionEl = document.getElementById('region');
      const searchEl = document.getElementById('search');
      const categoryEl = document.getElementById('category');
      const subCategoryEl = document.getElementById('sub-category');
      const tableBody = document.getElementById('catalog-body');
      const countEl = document.getElementById('result-count');

      function currentProducts() {{
        const r = regions[state.region];
        return r ? (r.products || []) : [];
      }}

      function distinct(products, key) {{
        const seen = new Set();
        const out = [];
        for (const p of products) {{
          const v = p[key];
          if (!v || seen.has(v)) continue;
          seen.add(v);
          out.push(v);
        }}
        return out;
      }}

      function fillSelect(select, label, values, selected) {{
        const parts = ['<option value="">' + label + ': ALL</option>'];
        for (const v of values) {{
          const sel = v === selected ? ' selected' : '';
          parts.push('<option value="' + escapeHtml(v) + '"' + sel + '>' + escapeHtml(v) + '</option>');
        }}
        select.innerHTML = parts.join('');
      }}

      function populateFilters() {{
        const products = currentProducts();
        const categories = distinct(products, 'main_category');
        const subCategories = distinct(products, 'sub_category');
        if (categories.indexOf(state.category) === -1) state.category = '';
        if (subCategories.indexOf(state.subCategory) === -1) state.subCategory = '';
        fillSelect(categoryEl, 'CATEGORY', categories, state.category);
        fillSelect(subCategoryEl, 'SUB-CATEGORY', subCategories, state.subCategory);
      }}

      function compilePattern(flags) {{
        return state.query ? new RegExp(escapeRegExp(state.query), flags) : null;
      }}

      function filterProducts() {{
        const matcher = compilePattern('iu');
        return currentProducts().filter(function(p) {{
          if (state.category && p.main_category !== state.category) return false;
          if (state.subCategory && p.sub_category !== state.subCategory) return false;
          if (matcher && !matcher.test(p._search)) return false;
          return true;
        }});
      }}

      function highlight(text, pattern) {{
        const s = String(text || '');
        if (!pattern) return escapeHtml(s);
        pattern.lastIndex = 0;
        let out = '';
        let last = 0;
        let m;
        while ((m = pattern.exec(s)) !== null) {{
          if (m[0].length === 0) {{
            pattern.lastIndex++;
            continue;
          }}
          out += escapeHtml(s.slice(last, m.index)) + '<mark>' + escapeHtml(m[0]) + '</mark>';
          last = m.index + m[0].length;
        }}
        return out + escapeHtml(s.slice(last));
      }}

      function render() {{
        const all = currentProducts();
        const items = filterProducts();
        const pattern = compilePattern('giu');
        const labels = priceLabels[state.region] || {{}};
        const rows = [];
        let openCategory = null;
        let openSubCategory = null;

        for (const p of items) {{
          const category = p.main_category || '';
          const subCategory = p.sub_category || '';
          if (openCategory === null || category !== openCategory) {{
            openCategory = category;
            openSubCategory = null;
            if (category) rows.push('<tr class="category-row"><th colspan="4" scope="colgroup">' + highlight(category, pattern) + '</th></tr>');
          }}
          if (openSubCategory === null || subCategory !== openSubCategory) {{
            openSubCategory = subCategory;
            if (subCategory) rows.push('<tr class="sub-category-row"><th colspan="4" scope="colgroup">' + highlight(subCategory, pattern) + '</th></tr>');
          }}
          rows.push(
            '<tr class="product-row" data-sku="' + escapeHtml(p.sku) + '">' +
            '<td class="sku">' + highlight(p.sku, pattern) + '</td>' +
            '<td>' + highlight(p.pole_height, pattern) + '</td>' +
            '<td>' + highlight(p.wall_thickness, pattern) + '</td>' +
            '<td class="price">' + escapeHtml(labels[p.sku] || '-') + '</td></tr>'
          );
        }}
        if (items.length === 0) {{
          rows.push('<tr class="empty-row"><td colspan="4">No products match the current filters.</td></tr>');
        }}

        tableBody.innerHTML = rows.join('');
        countEl.textContent = items.length + ' OF ' + all.length + ' PRODUCTS';
      }}

      let timer = null;
      let regionChanged = false;

      function schedule() {{
        if (timer !== null) clearTimeout(timer);
        timer = setTimeout(function() {{
          timer = null;
          if (regionChanged) {{
            regionChanged = false;
            populateFilters();
          }}
          render();
        }}, DEBOUNCE_MS);
      }}

      searchEl.addEventListener('input', function() {{
        state.query = searchEl.value || '';
        schedule();
      }});
      categoryEl.addEventListener('change', function() {{
        state.category = categoryEl.value || '';
        schedule();
      }});
      subCategoryEl.addEventListener('change', function() {{
        state.subCategory = subCategoryEl.value || '';
        schedule();
      }});
      regionEl.addEventListener('change', function() {{
        const next = regionEl.value || '';
        if (next !== state.region) {{
          state.region = next;
          state.category = '';
          state.subCategory = '';
          regionChanged = true;
        }}
        schedule();
      }});
    }})();
  </script>
</body>
</html>"####,
    );

    html.into_bytes()
}
