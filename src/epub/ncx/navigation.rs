//! NCX导航树

/// 导航点，`id` 由播放顺序生成（`navpoint-N`）
#[derive(Debug, Clone, PartialEq)]
pub struct NavPoint {
    pub id: String,
    pub play_order: u32,
    /// 导航标签文本
    pub label: String,
    /// 相对于NCX文件的引用，可带 `#锚点`
    pub src: String,
    pub children: Vec<NavPoint>,
}

impl NavPoint {
    pub fn new(play_order: u32, label: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id: format!("navpoint-{}", play_order),
            play_order,
            label: label.into(),
            src: src.into(),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: NavPoint) {
        self.children.push(child);
    }

    /// 以自身为根的层数
    pub fn depth(&self) -> u32 {
        1 + self.children.iter().map(NavPoint::depth).max().unwrap_or(0)
    }

    fn collect<'a>(&'a self, points: &mut Vec<&'a NavPoint>) {
        points.push(self);
        for child in &self.children {
            child.collect(points);
        }
    }
}

/// 导航地图
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavMap {
    pub points: Vec<NavPoint>,
}

impl NavMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: NavPoint) {
        self.points.push(point);
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 导航深度（dtb:depth），空地图为1
    pub fn depth(&self) -> u32 {
        self.points.iter().map(NavPoint::depth).max().unwrap_or(1)
    }

    /// 按播放顺序平铺的全部导航点
    pub fn flatten(&self) -> Vec<&NavPoint> {
        let mut points = Vec::new();
        for point in &self.points {
            point.collect(&mut points);
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_map_depth_and_flattening() {
        let mut chapter = NavPoint::new(1, "One", "ch1.xhtml");
        chapter.add_child(NavPoint::new(2, "One A", "ch1.xhtml#a"));
        chapter.add_child(NavPoint::new(3, "One B", "ch1.xhtml#b"));

        let mut nav_map = NavMap::new();
        nav_map.push(chapter);
        nav_map.push(NavPoint::new(4, "Two", "ch2.xhtml"));

        assert_eq!(nav_map.depth(), 2);
        let ids: Vec<&str> = nav_map.flatten().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["navpoint-1", "navpoint-2", "navpoint-3", "navpoint-4"]);
    }

    #[test]
    fn test_empty_nav_map_depth() {
        let nav_map = NavMap::new();
        assert!(nav_map.is_empty());
        assert_eq!(nav_map.depth(), 1);
    }
}
