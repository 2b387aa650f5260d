//! 专用版本探针
//! 常见前端库 -> 读取其声明版本号的运行时表达式

use std::collections::HashMap;

use once_cell::sync::Lazy;

// 技术名称需与特征库中的名称一致
const PROBE_TABLE: &[(&str, &str)] = &[
    ("jQuery", "jQuery.fn.jquery"),
    ("jQuery UI", "jQuery.ui.version"),
    ("jQuery Migrate", "jQuery.migrateVersion"),
    ("React", "React.version"),
    ("Vue.js", "Vue.version"),
    ("AngularJS", "angular.version.full"),
    ("Angular", "document.querySelector('[ng-version]').getAttribute('ng-version')"),
    ("Bootstrap", "(window.bootstrap ? bootstrap.Tooltip.VERSION : jQuery.fn.tooltip.Constructor.VERSION)"),
    ("Lodash", "_.VERSION"),
    ("Underscore.js", "_.VERSION"),
    ("Moment.js", "moment.version"),
    ("D3", "d3.version"),
    ("Backbone.js", "Backbone.VERSION"),
    ("Ember.js", "Ember.VERSION"),
    ("Prototype", "Prototype.Version"),
    ("MooTools", "MooTools.version"),
    ("Dojo", "dojo.version.toString()"),
    ("Knockout.js", "ko.version"),
    ("Handlebars", "Handlebars.VERSION"),
    ("Three.js", "THREE.REVISION"),
    ("Chart.js", "Chart.version"),
    ("GSAP", "gsap.version"),
    ("Modernizr", "Modernizr._version"),
    ("Alpine.js", "Alpine.version"),
    ("Highcharts", "Highcharts.version"),
    ("Leaflet", "L.version"),
    ("Next.js", "next.version"),
    ("Socket.io", "io.version"),
    ("Ext JS", "Ext.getVersion().version"),
];

static PROBES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| PROBE_TABLE.iter().copied().collect());

/// 版本探针
pub struct VersionProbe;

impl VersionProbe {
    /// 获取技术对应的探针脚本；求值失败或无值时脚本返回 null
    pub fn script_for(tech_name: &str) -> Option<String> {
        let expression = PROBES.get(tech_name)?;
        Some(format!(
            "(function () {{ try {{ var v = ({}); \
             return v !== undefined && v !== null && v !== '' ? String(v) : null; }} \
             catch (e) {{ return null; }} }})()",
            expression
        ))
    }

    /// 探针覆盖的技术名称
    pub fn technologies() -> impl Iterator<Item = &'static str> {
        PROBE_TABLE.iter().map(|(name, _)| *name)
    }

    /// 命中特征中使用的描述
    pub fn detail_for(tech_name: &str) -> String {
        format!("Version check: {}", tech_name)
    }
}
