/// Complete graph whose minimum spanning tree cost bounds a tour from below.
#[derive(Debug, Clone)]
pub(crate) struct Mst {
    vertices: usize,
    edges: Vec<(usize, usize, usize)>,
}

impl Mst {
    pub(crate) fn new(vertices: usize) -> Self {
        Mst {
            vertices,
            edges: Vec::new(),
        }
    }

    pub(crate) fn add_edge(&mut self, a: usize, b: usize, cost: usize) {
        self.edges.push((a, b, cost));
    }

    /// Kruskal.
    pub(crate) fn cost(mut self) -> usize {
        self.edges.sort_by_key(|&(_, _, cost)| cost);

        let mut sets = UnionFind::new(self.vertices);
        let mut components = self.vertices;
        let mut total_cost = 0;

        for (a, b, cost) in self.edges {
            if components <= 1 {
                break;
            }
            if sets.union(a, b) {
                total_cost += cost;
                components -= 1;
            }
        }

        total_cost
    }
}

#[derive(Debug, Clone)]
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, mut v: usize) -> usize {
        while self.parent[v] != v {
            self.parent[v] = self.parent[self.parent[v]];
            v = self.parent[v];
        }
        v
    }

    /// Joins the sets of `a` and `b`; false if they were already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return false;
        }
        match self.rank[a].cmp(&self.rank[b]) {
            std::cmp::Ordering::Less => self.parent[a] = b,
            std::cmp::Ordering::Greater => self.parent[b] = a,
            std::cmp::Ordering::Equal => {
                self.parent[b] = a;
                self.rank[a] += 1;
            }
        }
        true
    }
}
