/// Styling for the rendered figures
///
/// Passed to every render call; nothing about the figures is kept between calls
#[derive(Clone, Debug)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    pub caption: Option<String>,
    pub font_size: u32,
    /// x-axis range of the fit plot, automatic when `None`
    pub x_range: Option<(f64, f64)>,
    /// y-axis range of the fit plot, automatic when `None`
    pub y_range: Option<(f64, f64)>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        return PlotOptions {
            width: 800,
            height: 600,
            caption: None,
            font_size: 20,
            x_range: None,
            y_range: None,
        };
    }
}
